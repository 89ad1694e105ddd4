//! ADK api server 客户端
//!
//! 会话注册走 REST，run 走 /run_sse 的 SSE 流：按 `\n\n` 切出完整事件、
//! 取 `data: ` 行反序列化，经 mpsc 通道转成 EventStream。接收端丢弃流后
//! 发送失败，读取任务随之退出。

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::core::BridgeError;

use super::traits::{AgentEvent, AgentRuntime, EventStream};

/// ADK api server HTTP 客户端
pub struct AdkClient {
    http: reqwest::Client,
    base_url: String,
    app_name: String,
    request_timeout: Duration,
}

impl AdkClient {
    pub fn new(base_url: &str, app_name: &str, request_timeout_secs: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            app_name: app_name.to_string(),
            request_timeout: Duration::from_secs(request_timeout_secs),
        }
    }
}

#[async_trait]
impl AgentRuntime for AdkClient {
    async fn create_session(&self, user_id: &str, session_id: &str) -> Result<(), BridgeError> {
        let url = format!(
            "{}/apps/{}/users/{}/sessions/{}",
            self.base_url, self.app_name, user_id, session_id
        );
        let resp = self
            .http
            .post(&url)
            .timeout(self.request_timeout)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| BridgeError::SessionStore(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(());
        }
        let status = resp.status();
        let detail = resp.text().await.unwrap_or_default();
        // 确定性 ID 重建或并发注册撞到已有会话，视为注册成功
        if detail.contains("already exists") {
            tracing::debug!("Session {} already exists, reusing", session_id);
            return Ok(());
        }
        Err(BridgeError::SessionStore(format!("{}: {}", status, detail)))
    }

    async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        text: &str,
    ) -> Result<EventStream, BridgeError> {
        let body = serde_json::json!({
            "appName": self.app_name,
            "userId": user_id,
            "sessionId": session_id,
            "newMessage": { "role": "user", "parts": [{ "text": text }] },
            "streaming": false
        });

        // 不设整体超时：事件流持续到终端事件，时长由平台 Webhook 超时兜底
        let resp = self
            .http
            .post(format!("{}/run_sse", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| BridgeError::Runtime(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::NOT_FOUND || detail.contains("Session not found") {
                return Err(BridgeError::SessionNotFound);
            }
            return Err(BridgeError::Runtime(format!("{}: {}", status, detail)));
        }

        let (tx, rx) = mpsc::channel(100);
        let mut byte_stream = resp.bytes_stream();

        tokio::spawn(async move {
            let mut buffer = String::new();
            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(BridgeError::Runtime(e.to_string()))).await;
                        break;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                for data in drain_sse_events(&mut buffer) {
                    let item = serde_json::from_str::<AgentEvent>(&data)
                        .map_err(|e| BridgeError::AgentProtocol(e.to_string()));
                    if tx.send(item).await.is_err() {
                        // 接收端已停止消费（拿到终端事件后丢弃了流）
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// 取出缓冲区中已完整到达的 SSE 事件，返回各事件的 data 负载
fn drain_sse_events(buffer: &mut String) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(event_end) = buffer.find("\n\n") {
        let event_data: String = buffer.drain(..event_end).collect();
        buffer.drain(..2);
        for line in event_data.lines() {
            if let Some(data) = line.strip_prefix("data: ") {
                out.push(data.to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_keeps_partial_event_in_buffer() {
        let mut buffer = String::from("data: {\"isFinal\":false}\n\ndata: {\"isFi");
        let events = drain_sse_events(&mut buffer);
        assert_eq!(events, vec![r#"{"isFinal":false}"#]);
        assert_eq!(buffer, "data: {\"isFi");
    }

    #[test]
    fn test_drain_handles_multiple_events_per_chunk() {
        let mut buffer =
            String::from("data: {\"a\":1}\n\nevent: message\ndata: {\"b\":2}\n\n");
        let events = drain_sse_events(&mut buffer);
        assert_eq!(events, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_ignores_non_data_lines() {
        let mut buffer = String::from(": keepalive\nretry: 1000\n\n");
        assert!(drain_sse_events(&mut buffer).is_empty());
    }
}
