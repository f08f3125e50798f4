//! Clipboard collaborator used by the copy action.

use crate::error::Result;

/// Writes plain text to the system clipboard (or an equivalent).
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Notice shown to the user after a successful copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyNotice {
    pub title: String,
    pub body: String,
}

impl Default for CopyNotice {
    fn default() -> Self {
        Self {
            title: "Copied".to_string(),
            body: "Message copied to clipboard".to_string(),
        }
    }
}
