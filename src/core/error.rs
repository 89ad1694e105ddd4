//! 桥接过程中的错误类型
//!
//! 所有失败在到达 Webhook 边界前都会被折算成面向用户的文本或静默跳过；
//! SessionNotFound 单独成员，供编排器识别并触发一次换会话重试。

use thiserror::Error;

/// 消息桥接各环节可能出现的错误（会话、运行时、协议、时间戳、签名）
#[derive(Error, Debug)]
pub enum BridgeError {
    /// 远端会话已不存在，可换新会话重试一次
    #[error("session not found")]
    SessionNotFound,

    #[error("session store error: {0}")]
    SessionStore(String),

    #[error("agent runtime error: {0}")]
    Runtime(String),

    /// Agent 回复不是可识别的 JSON 结构
    #[error("agent protocol error: {0}")]
    AgentProtocol(String),

    /// 日期/时间不符合 YYYY-MM-DD / HH:mm
    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("invalid signature")]
    InvalidSignature,
}
