//! Conversation domain module.
//!
//! # Module Structure
//!
//! - `message`: Turn types (`MessageRole`, `MessageId`, `ChatMessage`)
//! - `transcript`: Ordered in-memory transcript (`TranscriptStore`)
//! - `composing`: Pending-reply state machine (`ComposingIndicator`)
//! - `action_menu`: Per-message selection state (`ActionMenu`)

mod action_menu;
mod composing;
mod message;
mod transcript;

// Re-export public API
pub use action_menu::{ActionMenu, MenuAction, MenuState};
pub use composing::{ComposingIndicator, ComposingState};
pub use message::{ChatMessage, MessageId, MessageRole};
pub use transcript::{PLACEHOLDER_ID, TranscriptStore};
