use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::models::ConversationSession;

/// Session persistence boundary. The transport delivers one turn per phone
/// at a time, so implementations need no per-session locking beyond their
/// own map.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, phone: &str) -> Option<ConversationSession>;
    async fn update(&self, phone: &str, session: ConversationSession);
    async fn clear(&self, phone: &str);
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, ConversationSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, phone: &str) -> Option<ConversationSession> {
        self.sessions
            .lock()
            .expect("session lock poisoned")
            .get(phone)
            .cloned()
    }

    async fn update(&self, phone: &str, session: ConversationSession) {
        self.sessions
            .lock()
            .expect("session lock poisoned")
            .insert(phone.to_string(), session);
    }

    async fn clear(&self, phone: &str) {
        debug!("Clearing session for {}", phone);
        self.sessions
            .lock()
            .expect("session lock poisoned")
            .remove(phone);
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{ConversationState, FlowKind};

    use super::*;

    #[tokio::test]
    async fn update_get_clear_cycle() {
        let store = InMemorySessionStore::new();
        assert!(store.get("549").await.is_none());

        store
            .update("549", ConversationSession::new(FlowKind::Turnos))
            .await;
        let session = store.get("549").await.expect("session stored");
        assert_eq!(session.state, ConversationState::CollectingName);

        store.clear("549").await;
        assert!(store.get("549").await.is_none());
    }
}
