//! LINE Messaging API 集成
//!
//! 通过 Webhook 接收群組訊息，调用编排器处理后经 Reply API 回复
//! 文本或 Flex 卡片。签名校验：`x-line-signature` 必须等于
//! base64(HMAC-SHA256(ChannelSecret, body))，不符直接回 400。

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use crate::calendar::EventCard;
use crate::core::{BridgeError, Orchestrator};
use crate::reply::{route, OutboundMessage};

type HmacSha256 = Hmac<Sha256>;

/// LINE 服务状态
pub struct LineState {
    pub orchestrator: Arc<Orchestrator>,
    pub channel_secret: String,
    pub channel_access_token: String,
    pub base_url: String,
}

/// Webhook 请求体
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub type_: Option<String>,
    #[serde(rename = "replyToken")]
    pub reply_token: Option<String>,
    pub source: Option<EventSource>,
    pub message: Option<MessageData>,
}

#[derive(Debug, Deserialize)]
pub struct EventSource {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageData {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub text: Option<String>,
}

/// 创建 LINE 路由
pub fn create_router(state: Arc<LineState>) -> Router {
    Router::new()
        .route("/callback", post(webhook_callback))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

/// POST /callback - 接收 LINE 平台事件
async fn webhook_callback(
    State(state): State<Arc<LineState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, StatusCode> {
    let signature = headers
        .get("x-line-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if verify_signature(&state.channel_secret, &body, signature).is_err() {
        tracing::warn!("LINE webhook: invalid signature, rejecting");
        return Err(StatusCode::BAD_REQUEST);
    }

    let payload: WebhookPayload =
        serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?;

    for event in payload.events {
        if event.type_.as_deref() != Some("message") {
            continue;
        }
        let Some(msg) = event.message else { continue };
        if msg.type_.as_deref() != Some("text") {
            continue;
        }
        let Some(text) = msg.text else { continue };
        let Some(user_id) = event.source.and_then(|s| s.user_id) else {
            continue;
        };
        let Some(reply_token) = event.reply_token else { continue };

        tracing::info!("Received message: {} from user: {}", text, user_id);

        let response = state.orchestrator.handle(&user_id, &text).await;
        let Some(outbound) = route(&response) else { continue };

        if let Err(e) = send_reply(&state, &reply_token, outbound).await {
            tracing::error!("Failed to send LINE reply: {}", e);
        }
    }

    Ok("OK")
}

/// 校验 Webhook 签名
pub fn verify_signature(
    channel_secret: &str,
    body: &[u8],
    signature: &str,
) -> Result<(), BridgeError> {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| BridgeError::InvalidSignature)?;
    mac.update(body);
    let expected = STANDARD.encode(mac.finalize().into_bytes());
    if expected == signature {
        Ok(())
    } else {
        Err(BridgeError::InvalidSignature)
    }
}

/// 通过 Reply API 发送回复
async fn send_reply(
    state: &LineState,
    reply_token: &str,
    outbound: OutboundMessage,
) -> anyhow::Result<()> {
    let message = match outbound {
        OutboundMessage::Text(text) => json!({ "type": "text", "text": text }),
        OutboundMessage::Card(card) => {
            let bubble = flex_bubble(&card);
            json!({ "type": "flex", "altText": card.header, "contents": bubble })
        }
    };

    let url = format!("{}/v2/bot/message/reply", state.base_url);
    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .bearer_auth(&state.channel_access_token)
        .json(&json!({ "replyToken": reply_token, "messages": [message] }))
        .send()
        .await?;

    if !resp.status().is_success() {
        let detail = resp.text().await?;
        anyhow::bail!("LINE API error: {}", detail);
    }
    Ok(())
}

/// 确认卡片的 Flex bubble 布局
fn flex_bubble(card: &EventCard) -> serde_json::Value {
    let body_lines: Vec<serde_json::Value> = card
        .lines
        .iter()
        .map(|line| json!({ "type": "text", "text": line }))
        .collect();

    json!({
        "type": "bubble",
        "header": {
            "type": "box",
            "layout": "vertical",
            "contents": [
                { "type": "text", "text": card.header, "weight": "bold", "size": "lg" }
            ]
        },
        "body": {
            "type": "box",
            "layout": "vertical",
            "spacing": "md",
            "contents": body_lines
        },
        "footer": {
            "type": "box",
            "layout": "vertical",
            "spacing": "sm",
            "contents": [
                {
                    "type": "button",
                    "style": "primary",
                    "action": {
                        "type": "uri",
                        "label": card.action_label,
                        "uri": card.link
                    }
                }
            ]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{build_card, EventRecord};

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        STANDARD.encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_signature_accepts_matching_mac() {
        let body = br#"{"events":[]}"#;
        let signature = sign("secret", body);
        assert!(verify_signature("secret", body, &signature).is_ok());
    }

    #[test]
    fn test_signature_rejects_tampered_body() {
        let signature = sign("secret", br#"{"events":[]}"#);
        let err = verify_signature("secret", br#"{"events":[{}]}"#, &signature);
        assert!(matches!(err, Err(BridgeError::InvalidSignature)));
    }

    #[test]
    fn test_signature_rejects_wrong_secret() {
        let body = br#"{"events":[]}"#;
        let signature = sign("other", body);
        assert!(verify_signature("secret", body, &signature).is_err());
    }

    #[test]
    fn test_webhook_payload_parses() {
        let raw = r#"{
            "destination": "U0000",
            "events": [{
                "type": "message",
                "replyToken": "rt-1",
                "source": { "type": "group", "groupId": "g1", "userId": "u1" },
                "message": { "id": "m1", "type": "text", "text": "明天開會" }
            }]
        }"#;
        let payload: WebhookPayload = serde_json::from_str(raw).unwrap();
        let event = &payload.events[0];
        assert_eq!(event.type_.as_deref(), Some("message"));
        assert_eq!(event.reply_token.as_deref(), Some("rt-1"));
        assert_eq!(
            event.source.as_ref().unwrap().user_id.as_deref(),
            Some("u1")
        );
        assert_eq!(
            event.message.as_ref().unwrap().text.as_deref(),
            Some("明天開會")
        );
    }

    #[test]
    fn test_flex_bubble_layout() {
        let record = EventRecord::new("開會", "2025-06-16", "14:00", "");
        let card = build_card(&record).unwrap();
        let bubble = flex_bubble(&card);

        assert_eq!(bubble["header"]["contents"][0]["text"], "事件確認");
        assert_eq!(bubble["body"]["contents"].as_array().unwrap().len(), 4);
        let button = &bubble["footer"]["contents"][0];
        assert_eq!(button["action"]["type"], "uri");
        assert_eq!(button["action"]["label"], "新增到行事曆");
        assert_eq!(button["action"]["uri"], card.link.as_str());
    }
}
