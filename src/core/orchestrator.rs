//! Agent 调用编排
//!
//! 对单条用户消息：盖上当前时间戳、取得会话、提交运行时并顺序消费事件流，
//! 第一个终端事件即为结果。远端会话丢失时清掉映射、换新会话恰好重试一次；
//! 其余失败不重试。本层总是返回字符串，错误在此折算成面向用户的文本。

use std::sync::Arc;

use futures_util::StreamExt;

use crate::clock;
use crate::core::{BridgeError, SessionRegistry};
use crate::runtime::AgentRuntime;

/// 事件流里没有出现终端事件时的兜底回复
pub const NO_FINAL_RESPONSE: &str = "Agent did not produce a final response.";

/// 消息编排器：会话注册表 + Agent 运行时
pub struct Orchestrator {
    runtime: Arc<dyn AgentRuntime>,
    sessions: SessionRegistry,
}

impl Orchestrator {
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        let sessions = SessionRegistry::new(runtime.clone());
        Self { runtime, sessions }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// 处理一条用户消息，返回 Agent 的最终文本
    ///
    /// 不会失败：所有错误在返回前折算成文本。
    pub async fn handle(&self, user_id: &str, text: &str) -> String {
        let query = format!(
            "現在時間是 {}，請以此為基準處理「明天」、「後天」、「下週一」、「今天下午」等模糊時間\n user message:{}",
            clock::now_taipei(),
            text
        );
        tracing::info!(">>> User query: {}", query);

        let response = self.dispatch(user_id, &query).await;
        tracing::info!("<<< Agent response: {}", response);
        response
    }

    async fn dispatch(&self, user_id: &str, query: &str) -> String {
        let session_id = match self.sessions.get_or_create(user_id).await {
            Ok(id) => id,
            Err(e) => return format!("Sorry, I encountered an error: {}", e),
        };

        match self.run_once(user_id, &session_id, query).await {
            Ok(text) => text,
            Err(BridgeError::SessionNotFound) => {
                tracing::warn!("Session lost for user {}, recreating and retrying", user_id);
                self.sessions.invalidate(user_id).await;
                let session_id = match self.sessions.get_or_create(user_id).await {
                    Ok(id) => id,
                    Err(e) => return format!("Sorry, I encountered an error: {}", e),
                };
                match self.run_once(user_id, &session_id, query).await {
                    Ok(text) => text,
                    Err(e) => format!("Sorry, I encountered an error: {}", e),
                }
            }
            Err(e) => format!("Sorry, I encountered an error: {}", e),
        }
    }

    /// 跑一轮运行时调用，消费事件流直到第一个终端事件
    async fn run_once(
        &self,
        user_id: &str,
        session_id: &str,
        query: &str,
    ) -> Result<String, BridgeError> {
        let mut stream = self.runtime.run(user_id, session_id, query).await?;

        while let Some(event) = stream.next().await {
            let event = event?;
            if !event.is_final {
                continue;
            }
            // 终端事件：优先取文本，其次取 escalation，都没有则视为空响应
            if let Some(text) = event.text() {
                return Ok(text.to_string());
            }
            if let Some(escalation) = event.escalation {
                return Ok(format!(
                    "Agent escalated: {}",
                    escalation.message.as_deref().unwrap_or("No specific message.")
                ));
            }
            return Ok(NO_FINAL_RESPONSE.to_string());
        }

        Ok(NO_FINAL_RESPONSE.to_string())
    }
}
