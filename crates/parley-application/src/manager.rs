//! Conversation lifecycle management.

use crate::session::ConversationSession;
use parley_core::config::SyncPolicy;
use parley_core::gateway::SyncGateway;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps at most one conversation open at a time.
///
/// `ConversationManager` is responsible for:
/// - Listing the personas the user has conversations with
/// - Opening a conversation (closing the previous one first)
/// - Closing the active conversation when the user navigates away
///
/// Nothing is cached across conversations: re-entering a persona fetches its
/// transcript again.
pub struct ConversationManager {
    gateway: Arc<dyn SyncGateway>,
    policy: SyncPolicy,
    active: RwLock<Option<ConversationSession>>,
}

impl ConversationManager {
    pub fn new(gateway: Arc<dyn SyncGateway>, policy: SyncPolicy) -> Self {
        Self {
            gateway,
            policy,
            active: RwLock::new(None),
        }
    }

    /// Persona names with an existing conversation.
    ///
    /// Failures (including a missing credential) are logged and yield an
    /// empty list.
    pub async fn list_conversations(&self) -> Vec<String> {
        match self.gateway.list_conversations().await {
            Ok(personas) => personas,
            Err(e) => {
                tracing::warn!("[ConversationManager] Error fetching chats: {}", e);
                Vec::new()
            }
        }
    }

    /// Opens `persona`, closing whichever conversation was active.
    pub async fn open(&self, persona: impl Into<String>) -> ConversationSession {
        let persona: String = persona.into();
        self.close_active().await;

        let session = ConversationSession::open(self.gateway.clone(), persona, self.policy).await;

        let mut active = self.active.write().await;
        if let Some(previous) = active.replace(session.clone()) {
            // Another open raced this one; only the latest stays active.
            previous.close();
        }
        session
    }

    /// Returns the currently active conversation.
    pub async fn active(&self) -> Option<ConversationSession> {
        self.active.read().await.clone()
    }

    /// Closes the active conversation, if any.
    pub async fn close_active(&self) {
        if let Some(session) = self.active.write().await.take() {
            session.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_core::conversation::ChatMessage;
    use parley_core::error::{ParleyError, Result};
    use parley_core::gateway::RemoteMessage;

    struct DirectoryGateway {
        personas: Result<Vec<String>>,
    }

    #[async_trait]
    impl SyncGateway for DirectoryGateway {
        async fn fetch_transcript(&self, _persona: &str) -> Result<Vec<RemoteMessage>> {
            Ok(Vec::new())
        }

        async fn send_turn(&self, _persona: &str, _content: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn edit_turn(&self, _: &str, _: &ChatMessage, _: &str) -> Result<()> {
            Ok(())
        }

        async fn delete_turn(&self, _: &str, _: &ChatMessage) -> Result<()> {
            Ok(())
        }

        async fn list_conversations(&self) -> Result<Vec<String>> {
            self.personas.clone()
        }
    }

    fn manager(personas: Result<Vec<String>>) -> ConversationManager {
        ConversationManager::new(
            Arc::new(DirectoryGateway { personas }),
            SyncPolicy::default(),
        )
    }

    #[tokio::test]
    async fn test_list_conversations() {
        let manager = manager(Ok(vec!["Mira".to_string(), "Orin".to_string()]));
        assert_eq!(manager.list_conversations().await, vec!["Mira", "Orin"]);
    }

    #[tokio::test]
    async fn test_list_conversations_failure_is_empty() {
        let manager = manager(Err(ParleyError::MissingCredential));
        assert!(manager.list_conversations().await.is_empty());
    }

    #[tokio::test]
    async fn test_opening_second_conversation_closes_first() {
        let manager = manager(Ok(Vec::new()));

        let first = manager.open("Mira").await;
        let second = manager.open("Orin").await;

        assert!(first.is_closed());
        assert!(!second.is_closed());
        assert_eq!(manager.active().await.unwrap().persona(), "Orin");

        manager.close_active().await;
        assert!(second.is_closed());
        assert!(manager.active().await.is_none());
    }
}
