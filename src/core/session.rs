//! 会话注册表
//!
//! 维护 user_id -> session_id 的进程内映射。会话 ID 由 user_id 确定性生成，
//! 首次接触时向远端会话存储注册，之后直接复用；远端会话丢失时由编排器调用
//! invalidate 清除映射再重建。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::core::BridgeError;
use crate::runtime::AgentRuntime;

/// 用户会话注册表（跨请求共享，可并发访问）
pub struct SessionRegistry {
    runtime: Arc<dyn AgentRuntime>,
    sessions: RwLock<HashMap<String, String>>,
}

impl SessionRegistry {
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        Self {
            runtime,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// 取得用户的会话 ID，没有则注册一个新会话
    ///
    /// 首次注册持写锁完成「查-建-记」，同一用户并发的首条消息只会注册一次。
    pub async fn get_or_create(&self, user_id: &str) -> Result<String, BridgeError> {
        if let Some(session_id) = self.sessions.read().await.get(user_id) {
            tracing::debug!("Using existing session: user={} session={}", user_id, session_id);
            return Ok(session_id.clone());
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session_id) = sessions.get(user_id) {
            return Ok(session_id.clone());
        }

        let session_id = format!("session_{}", user_id);
        self.runtime.create_session(user_id, &session_id).await?;
        sessions.insert(user_id.to_string(), session_id.clone());
        tracing::info!("New session created: user={} session={}", user_id, session_id);

        Ok(session_id)
    }

    /// 移除用户的会话映射（仅在远端报告会话不存在后调用）
    pub async fn invalidate(&self, user_id: &str) {
        if self.sessions.write().await.remove(user_id).is_some() {
            tracing::info!("Session invalidated: user={}", user_id);
        }
    }

    /// 查询用户当前的会话 ID
    pub async fn get(&self, user_id: &str) -> Option<String> {
        self.sessions.read().await.get(user_id).cloned()
    }

    /// 当前注册的会话数
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let mock = Arc::new(MockRuntime::default());
        let registry = SessionRegistry::new(mock.clone());

        let first = registry.get_or_create("u1").await.unwrap();
        let second = registry.get_or_create("u1").await.unwrap();

        assert_eq!(first, "session_u1");
        assert_eq!(first, second);
        assert_eq!(mock.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_fresh_registration() {
        let mock = Arc::new(MockRuntime::default());
        let registry = SessionRegistry::new(mock.clone());

        let first = registry.get_or_create("u1").await.unwrap();
        registry.invalidate("u1").await;
        let second = registry.get_or_create("u1").await.unwrap();

        // 会话 ID 确定性不变，但远端注册是新的
        assert_eq!(first, second);
        assert_eq!(mock.created.lock().unwrap().len(), 2);
        assert_eq!(registry.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_users_get_separate_sessions() {
        let mock = Arc::new(MockRuntime::default());
        let registry = SessionRegistry::new(mock.clone());

        let a = registry.get_or_create("u1").await.unwrap();
        let b = registry.get_or_create("u2").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(registry.active_count().await, 2);
    }
}
