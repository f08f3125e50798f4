//! Per-message action menu (copy / delete / edit).
//!
//! The menu only tracks which already-rendered message is targeted. The
//! actions themselves (clipboard writes, remote calls, store mutations) are
//! carried out by the session that owns the menu.

use super::message::ChatMessage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MenuState {
    #[default]
    None,
    Selected(ChatMessage),
    EditOpen { message: ChatMessage, draft: String },
}

/// The three actions offered for a selected message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MenuAction {
    Copy,
    Delete,
    Edit,
}

/// Selection state machine: `None → Selected → {EditOpen | None}`.
///
/// At most one message is selected and at most one is in edit at any time.
#[derive(Debug, Clone, Default)]
pub struct ActionMenu {
    state: MenuState,
}

impl ActionMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    /// The targeted message, whether merely selected or being edited.
    pub fn target(&self) -> Option<&ChatMessage> {
        match &self.state {
            MenuState::None => None,
            MenuState::Selected(message) => Some(message),
            MenuState::EditOpen { message, .. } => Some(message),
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match &self.state {
            MenuState::EditOpen { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Long-press equivalent. Replaces any previous selection or open edit.
    pub fn select(&mut self, message: ChatMessage) {
        self.state = MenuState::Selected(message);
    }

    /// Closes the menu or the edit dialog without side effects.
    pub fn dismiss(&mut self) {
        self.state = MenuState::None;
    }

    /// Fires a terminal action (copy or delete) on the selection.
    ///
    /// Returns the selected message and resets to `None`. Returns `None` and
    /// leaves the state untouched when nothing is selected; `Edit` is not
    /// terminal and goes through [`open_edit`](Self::open_edit) instead.
    pub fn take(&mut self, action: MenuAction) -> Option<ChatMessage> {
        if action == MenuAction::Edit {
            return None;
        }
        match std::mem::take(&mut self.state) {
            MenuState::Selected(message) => Some(message),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// `Selected → EditOpen`, seeding the draft with the current content.
    pub fn open_edit(&mut self) -> Option<&str> {
        self.state = match std::mem::take(&mut self.state) {
            MenuState::Selected(message) => {
                let draft = message.content.clone();
                MenuState::EditOpen { message, draft }
            }
            other => other,
        };
        self.draft()
    }

    /// Replaces the draft text. Returns `false` if no edit is open.
    pub fn set_draft(&mut self, text: impl Into<String>) -> bool {
        match &mut self.state {
            MenuState::EditOpen { draft, .. } => {
                *draft = text.into();
                true
            }
            _ => false,
        }
    }

    /// Confirms the open edit.
    ///
    /// Returns the original message and the draft and resets to `None`. A
    /// blank draft is refused: nothing is returned and the edit stays open.
    pub fn confirm_edit(&mut self) -> Option<(ChatMessage, String)> {
        match std::mem::take(&mut self.state) {
            MenuState::EditOpen { message, draft } if !draft.trim().is_empty() => {
                Some((message, draft))
            }
            other => {
                self.state = other;
                None
            }
        }
    }
}
