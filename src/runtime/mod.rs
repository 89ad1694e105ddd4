//! Agent 运行时客户端
//!
//! 所有后端（ADK api server / Mock）实现 AgentRuntime：create_session 注册远端会话，
//! run 提交一轮查询并返回事件流。

pub mod adk;
pub mod mock;
pub mod traits;

pub use adk::AdkClient;
pub use mock::{MockRuntime, RunScript};
pub use traits::{AgentEvent, AgentRuntime, Escalation, EventContent, EventStream};
