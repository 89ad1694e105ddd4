//! 消息桥接集成测试（Mock 运行时，不走网络）

use std::sync::Arc;

use eventmind::core::Orchestrator;
use eventmind::reply::{route, OutboundMessage};
use eventmind::runtime::{AgentEvent, MockRuntime, RunScript};

#[tokio::test]
async fn test_event_reply_builds_calendar_card() {
    let raw = "```json\n{\"type\": \"Event\", \"data\": {\"title\": \"開會\", \"date\": \"2025-06-16\", \"time\": \"14:00\", \"note\": \"請帶鉛筆盒\"}}\n```";
    let mock = Arc::new(MockRuntime::scripted(vec![RunScript::Events(vec![
        Ok(AgentEvent::intermediate("解析中")),
        Ok(AgentEvent::final_text(raw)),
    ])]));
    let orchestrator = Orchestrator::new(mock.clone());

    let response = orchestrator.handle("U123", "明天下午兩點開會").await;
    let outbound = route(&response);

    let Some(OutboundMessage::Card(card)) = outbound else {
        panic!("expected card, got {:?}", outbound);
    };
    assert!(card.link.contains("dates=20250616T1400/20250616T1500"));
    assert_eq!(card.lines[3], "備註：請帶鉛筆盒");
    assert_eq!(mock.created.lock().unwrap().as_slice(), ["session_U123"]);

    // 同一用户的下一条消息复用会话
    orchestrator.handle("U123", "改成三點").await;
    assert_eq!(mock.created.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_session_recovery_then_follow_up_question() {
    let follow_up = r#"{"type":"NeedMoreDetails","data":{"message":"請問是哪一天呢？"}}"#;
    let mock = Arc::new(MockRuntime::scripted(vec![
        RunScript::Fail(eventmind::core::BridgeError::SessionNotFound),
        RunScript::Events(vec![Ok(AgentEvent::final_text(follow_up))]),
    ]));
    let orchestrator = Orchestrator::new(mock.clone());

    let response = orchestrator.handle("U123", "開會").await;
    assert_eq!(
        route(&response),
        Some(OutboundMessage::Text("請問是哪一天呢？".to_string()))
    );
    // 失效重建：注册了两次，但最终只有一个会话在册
    assert_eq!(mock.created.lock().unwrap().len(), 2);
    assert_eq!(orchestrator.sessions().active_count().await, 1);
}

#[tokio::test]
async fn test_no_response_is_silent() {
    let mock = Arc::new(MockRuntime::scripted(vec![RunScript::Events(vec![Ok(
        AgentEvent::final_text(r#"{"type":"NoResponse"}"#),
    )])]));
    let orchestrator = Orchestrator::new(mock);

    let response = orchestrator.handle("U123", "午餐吃什麼").await;
    assert_eq!(route(&response), None);
}
