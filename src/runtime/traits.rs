//! Agent 运行时抽象
//!
//! 一次 run 产生零或多个中间事件加恰好一个终端事件；消费方在第一个终端事件
//! 处停止拉取即可，丢弃流即取消后续消费。

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde::Deserialize;

use crate::core::BridgeError;

/// 运行时事件流
pub type EventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent, BridgeError>> + Send>>;

/// 运行时事件
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEvent {
    /// 是否为本轮的终端事件
    #[serde(default)]
    pub is_final: bool,
    pub content: Option<EventContent>,
    pub escalation: Option<Escalation>,
}

/// 事件携带的文本内容
#[derive(Debug, Clone, Deserialize)]
pub struct EventContent {
    pub text: String,
}

/// 运行时上报的升级/错误信号
#[derive(Debug, Clone, Deserialize)]
pub struct Escalation {
    pub message: Option<String>,
}

impl AgentEvent {
    /// 带文本的终端事件
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            is_final: true,
            content: Some(EventContent { text: text.into() }),
            escalation: None,
        }
    }

    /// 非终端的中间事件
    pub fn intermediate(text: impl Into<String>) -> Self {
        Self {
            is_final: false,
            content: Some(EventContent { text: text.into() }),
            escalation: None,
        }
    }

    /// 带升级信号的终端事件
    pub fn escalated(message: Option<String>) -> Self {
        Self {
            is_final: true,
            content: None,
            escalation: Some(Escalation { message }),
        }
    }

    /// 事件文本（无内容时为 None）
    pub fn text(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.text.as_str())
    }
}

/// Agent 运行时客户端 trait
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// 在远端会话存储注册 (app_name, user_id, session_id)
    async fn create_session(&self, user_id: &str, session_id: &str) -> Result<(), BridgeError>;

    /// 提交一轮用户查询，返回事件流
    async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        text: &str,
    ) -> Result<EventStream, BridgeError>;
}
