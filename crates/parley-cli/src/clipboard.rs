//! System clipboard backed by `arboard`.

use parley_core::clipboard::Clipboard;
use parley_core::error::{ParleyError, Result};

/// `arboard::Clipboard` is not `Sync`, so a handle is opened per write.
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ParleyError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ParleyError::Clipboard(e.to_string()))
    }
}
