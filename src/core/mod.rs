//! 核心编排层：错误类型、会话注册表、Agent 调用循环

pub mod error;
pub mod orchestrator;
pub mod session;

pub use error::BridgeError;
pub use orchestrator::Orchestrator;
pub use session::SessionRegistry;
