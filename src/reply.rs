//! Agent 回复解析与路由
//!
//! Agent 以 JSON 包装回复：NoResponse（不回话）、NeedMoreDetails（追问文本）、
//! Event（完整事件，回确认卡片）。运行时偶尔会把 JSON 包进 Markdown 代码栅栏，
//! 解析前先剥掉。无法识别的结构一律回固定错误文案，不向上抛。

use serde::Deserialize;

use crate::calendar::{build_card, EventCard, EventRecord};

/// 解析失败或卡片生成失败时的回复文案
pub const GENERIC_ERROR_TEXT: &str = "發生錯誤";

/// Agent 回复的三种结构
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AgentReply {
    /// 与活动无关，不需要回话
    NoResponse,
    /// 信息不全，向用户追问
    NeedMoreDetails { message: String },
    /// 完整事件；缺字段时代入占位值
    Event {
        #[serde(default = "default_title")]
        title: String,
        #[serde(default = "default_date")]
        date: String,
        #[serde(default = "default_time")]
        time: String,
        #[serde(default)]
        note: String,
    },
}

fn default_title() -> String {
    "untitled".to_string()
}

fn default_date() -> String {
    "unknown".to_string()
}

fn default_time() -> String {
    "unknown".to_string()
}

/// 发往平台的消息
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Text(String),
    Card(EventCard),
}

/// 把 Agent 的原始文本路由成出站消息；None 表示什么都不发
pub fn route(raw: &str) -> Option<OutboundMessage> {
    let cleaned = strip_code_fences(raw);

    let reply = match serde_json::from_str::<AgentReply>(&cleaned) {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!("Unparseable agent reply ({}): {}", e, cleaned);
            return Some(OutboundMessage::Text(GENERIC_ERROR_TEXT.to_string()));
        }
    };

    match reply {
        AgentReply::NoResponse => None,
        AgentReply::NeedMoreDetails { message } => Some(OutboundMessage::Text(message)),
        AgentReply::Event {
            title,
            date,
            time,
            note,
        } => {
            let record = EventRecord::new(title, date, time, note);
            match build_card(&record) {
                Ok(card) => Some(OutboundMessage::Card(card)),
                Err(e) => {
                    tracing::warn!("Card build failed: {}", e);
                    Some(OutboundMessage::Text(GENERIC_ERROR_TEXT.to_string()))
                }
            }
        }
    }
}

/// 剥掉运行时可能包上的 Markdown 代码栅栏
fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace('`', "").trim().to_string()
}
