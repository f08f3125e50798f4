//! Application services for Parley.
//!
//! - `session`: the synchronization engine for one open conversation
//! - `manager`: opening/closing conversations, listing personas

mod manager;
mod session;

pub use manager::ConversationManager;
pub use session::{ConversationSession, SessionAction, SessionEvent};
