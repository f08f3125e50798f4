//! Conversation message types.
//!
//! This module contains the types that make up a transcript: the role of a
//! turn, the local message identifier, and the message itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the role of a visible message in a conversation.
///
/// System-level entries are filtered out on load and never reach this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the persona.
    Assistant,
}

impl MessageRole {
    /// Parses a remote role string; anything other than `user` or
    /// `assistant` yields `None`.
    pub fn from_remote(role: &str) -> Option<Self> {
        match role {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a message, unique within one conversation.
///
/// Loaded messages get their position (`"0"`, `"1"`, ...), locally appended
/// ones a timestamp-derived value, and the placeholder the fixed id `default`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single visible turn in a conversation.
///
/// The serialized form `{id, role, content}` is also what the remote store
/// receives when a message is edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(id: impl Into<MessageId>, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
        }
    }

    /// True when role and content both match, which is how the remote store
    /// correlates deletes and edits.
    pub fn matches(&self, role: MessageRole, content: &str) -> bool {
        self.role == role && self.content == content
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
