//! Remote conversation store contract.
//!
//! `SyncGateway` is the only way the engine talks to the remote store. Each
//! method is one request/response exchange: no retries, no backoff, no
//! deduplication. Implementations must fail fast with
//! [`ParleyError::MissingCredential`](crate::ParleyError::MissingCredential) or
//! [`ParleyError::MissingPersona`](crate::ParleyError::MissingPersona) before
//! attempting a request when a precondition is unmet.

use crate::conversation::ChatMessage;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A transcript entry as stored remotely.
///
/// Roles are kept as raw strings here; system entries and unknown roles are
/// dropped when the transcript is loaded into a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl RemoteMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// Fetches the full remote transcript for a persona, oldest first.
    async fn fetch_transcript(&self, persona: &str) -> Result<Vec<RemoteMessage>>;

    /// Appends a user turn remotely and returns the persona's reply text.
    async fn send_turn(&self, persona: &str, content: &str) -> Result<String>;

    /// Replaces the content of the remote turn matching `original`'s role and content.
    async fn edit_turn(
        &self,
        persona: &str,
        original: &ChatMessage,
        new_content: &str,
    ) -> Result<()>;

    /// Deletes the remote turn(s) matching `message`'s role and content.
    async fn delete_turn(&self, persona: &str, message: &ChatMessage) -> Result<()>;

    /// Lists the persona names the current user has conversations with.
    async fn list_conversations(&self) -> Result<Vec<String>>;
}
