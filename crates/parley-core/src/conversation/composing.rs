//! Composing indicator for outstanding persona replies.

use serde::{Deserialize, Serialize};

/// Whether a persona reply is pending for the active conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComposingState {
    #[default]
    Idle,
    Waiting,
}

/// State machine that is `Waiting` strictly between the issuance of a send
/// and its settlement.
///
/// Settlement returns to `Idle` whether the call succeeded or failed. The
/// machine itself does not refuse a second `begin` while `Waiting`; callers
/// that want single-flight sends check [`is_waiting`](Self::is_waiting)
/// first.
#[derive(Debug, Clone, Default)]
pub struct ComposingIndicator {
    state: ComposingState,
}

impl ComposingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ComposingState {
        self.state
    }

    pub fn is_waiting(&self) -> bool {
        self.state == ComposingState::Waiting
    }

    /// Marks a send as issued. Returns `true` if the state changed.
    pub fn begin(&mut self) -> bool {
        let changed = self.state == ComposingState::Idle;
        self.state = ComposingState::Waiting;
        changed
    }

    /// Marks the outstanding send as settled. Returns `true` if the state changed.
    pub fn settle(&mut self) -> bool {
        let changed = self.state == ComposingState::Waiting;
        self.state = ComposingState::Idle;
        changed
    }

    /// Text a front-end shows while waiting, e.g. `Mira is typing...`.
    pub fn label(&self, persona: &str) -> Option<String> {
        self.is_waiting().then(|| format!("{} is typing...", persona))
    }
}
