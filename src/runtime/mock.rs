//! Mock 运行时（用于测试，无需网络）
//!
//! 按脚本顺序应答 run 调用，并记录 create_session / run 的调用实参。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;

use crate::core::BridgeError;

use super::traits::{AgentEvent, AgentRuntime, EventStream};

/// 一次 run 调用的脚本
pub enum RunScript {
    /// 返回既定的事件序列（条目可为 Err，模拟流中途失败）
    Events(Vec<Result<AgentEvent, BridgeError>>),
    /// run 调用直接失败
    Fail(BridgeError),
}

/// 脚本化运行时：依序弹出脚本应答，脚本耗尽后返回空事件流
#[derive(Default)]
pub struct MockRuntime {
    scripts: Mutex<VecDeque<RunScript>>,
    /// 每次 create_session 收到的 session_id
    pub created: Mutex<Vec<String>>,
    /// 每次 run 收到的 (session_id, text)
    pub runs: Mutex<Vec<(String, String)>>,
    /// 置入后，下一次 create_session 以该错误失败
    pub fail_create: Mutex<Option<BridgeError>>,
}

impl MockRuntime {
    pub fn scripted(scripts: Vec<RunScript>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl AgentRuntime for MockRuntime {
    async fn create_session(&self, _user_id: &str, session_id: &str) -> Result<(), BridgeError> {
        self.created.lock().unwrap().push(session_id.to_string());
        if let Some(err) = self.fail_create.lock().unwrap().take() {
            return Err(err);
        }
        Ok(())
    }

    async fn run(
        &self,
        _user_id: &str,
        session_id: &str,
        text: &str,
    ) -> Result<EventStream, BridgeError> {
        self.runs
            .lock()
            .unwrap()
            .push((session_id.to_string(), text.to_string()));

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RunScript::Events(Vec::new()));

        match script {
            RunScript::Events(items) => Ok(Box::pin(stream::iter(items))),
            RunScript::Fail(err) => Err(err),
        }
    }
}
