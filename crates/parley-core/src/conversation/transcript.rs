//! Ordered in-memory transcript of the active conversation.

use super::message::{ChatMessage, MessageId, MessageRole};
use crate::gateway::{RemoteMessage, SyncGateway};

/// Id of the synthetic placeholder message.
pub const PLACEHOLDER_ID: &str = "default";

/// Owns the ordered message sequence for the currently open conversation.
///
/// Every mutation, optimistic or remote-confirmed, goes through this type.
/// Messages are never reordered: appends go to the end, edits happen in
/// place, removals drop a single entry.
///
/// There is no undo log. Callers that want to revert an optimistic change
/// use the values returned by [`edit_local`](Self::edit_local) and
/// [`append_local`](Self::append_local).
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    persona: String,
    messages: Vec<ChatMessage>,
    /// Last millisecond stamp handed out as a local id.
    last_local_stamp: i64,
}

impl TranscriptStore {
    /// Creates a store holding only the placeholder message for `persona`.
    pub fn placeholder(persona: impl Into<String>) -> Self {
        let persona = persona.into();
        let messages = vec![placeholder_message(&persona)];
        Self {
            persona,
            messages,
            last_local_stamp: 0,
        }
    }

    /// Builds a store from a fetched remote transcript.
    ///
    /// Entries whose role is neither `user` nor `assistant` are dropped and the
    /// survivors get positional ids. An empty result falls back to the
    /// placeholder.
    pub fn from_remote(persona: impl Into<String>, remote: Vec<RemoteMessage>) -> Self {
        let persona = persona.into();
        let messages: Vec<ChatMessage> = remote
            .into_iter()
            .filter_map(|entry| {
                MessageRole::from_remote(&entry.role).map(|role| (role, entry.content))
            })
            .enumerate()
            .map(|(index, (role, content))| ChatMessage::new(index.to_string(), role, content))
            .collect();

        if messages.is_empty() {
            return Self::placeholder(persona);
        }

        Self {
            persona,
            messages,
            last_local_stamp: 0,
        }
    }

    /// Loads the transcript for `persona` through the gateway.
    ///
    /// Never fails: any error (missing credential, missing persona, transport,
    /// server) is logged and the placeholder conversation is returned instead.
    pub async fn load(gateway: &dyn SyncGateway, persona: &str) -> Self {
        match gateway.fetch_transcript(persona).await {
            Ok(remote) => {
                tracing::debug!(
                    "[TranscriptStore] Fetched {} remote entries for '{}'",
                    remote.len(),
                    persona
                );
                Self::from_remote(persona, remote)
            }
            Err(e) => {
                tracing::warn!("[TranscriptStore] Error fetching chat for '{}': {}", persona, e);
                Self::placeholder(persona)
            }
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// True when the store only holds the synthetic placeholder.
    pub fn is_placeholder_only(&self) -> bool {
        self.messages.len() == 1 && self.messages[0].id.as_str() == PLACEHOLDER_ID
    }

    /// Appends a message with a fresh local id. This is the optimistic step
    /// and runs before any remote confirmation.
    pub fn append_local(&mut self, role: MessageRole, content: impl Into<String>) -> ChatMessage {
        let id = self.next_local_id();
        let message = ChatMessage::new(id, role, content);
        self.messages.push(message.clone());
        message
    }

    /// Appends the persona's reply returned by a successful send.
    pub fn confirm_remote_reply(&mut self, content: impl Into<String>) -> ChatMessage {
        self.append_local(MessageRole::Assistant, content)
    }

    /// Replaces the content of the message with `id`, keeping id and role.
    ///
    /// Returns the previous content, or `None` (and changes nothing) when no
    /// message has that id.
    pub fn edit_local(&mut self, id: &MessageId, new_content: impl Into<String>) -> Option<String> {
        let message = self.messages.iter_mut().find(|m| &m.id == id)?;
        Some(std::mem::replace(&mut message.content, new_content.into()))
    }

    /// Removes the first message whose role and content both match.
    ///
    /// Two identical messages from the same role cannot be told apart: only
    /// the earliest one is removed.
    pub fn remove_local(&mut self, role: MessageRole, content: &str) -> Option<ChatMessage> {
        let index = self.messages.iter().position(|m| m.matches(role, content))?;
        Some(self.messages.remove(index))
    }

    /// Removes the message with `id`. Used to revert an optimistic append.
    pub fn remove_by_id(&mut self, id: &MessageId) -> Option<ChatMessage> {
        let index = self.messages.iter().position(|m| &m.id == id)?;
        Some(self.messages.remove(index))
    }

    /// Produces a millisecond-timestamp id that is strictly greater than any
    /// id handed out before and not already present in the sequence.
    fn next_local_id(&mut self) -> MessageId {
        let mut stamp = chrono::Utc::now()
            .timestamp_millis()
            .max(self.last_local_stamp + 1);
        while self.messages.iter().any(|m| m.id.as_str() == stamp.to_string()) {
            stamp += 1;
        }
        self.last_local_stamp = stamp;
        MessageId::new(stamp.to_string())
    }
}

fn placeholder_message(persona: &str) -> ChatMessage {
    ChatMessage::new(
        PLACEHOLDER_ID,
        MessageRole::Assistant,
        format!("Start talking to {}", persona),
    )
}
