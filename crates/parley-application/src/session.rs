//! Conversation session: the synchronization engine for one open conversation.
//!
//! A session owns the transcript, the composing indicator and the action menu
//! for a single persona, and runs every user action through the same shape:
//!
//! 1. apply the optimistic local mutation (if the action has one)
//! 2. issue exactly one `SyncGateway` call
//! 3. on settlement, confirm or (by policy) roll back
//!
//! Every call is bound to the session's lifetime. After [`close`] the
//! in-flight calls are dropped and nothing they return touches the store.
//!
//! [`close`]: ConversationSession::close

use parley_core::clipboard::{Clipboard, CopyNotice};
use parley_core::config::{DivergencePolicy, SendGuard, SyncPolicy};
use parley_core::conversation::{
    ActionMenu, ChatMessage, ComposingIndicator, ComposingState, MenuAction, MenuState, MessageId,
    MessageRole, TranscriptStore,
};
use parley_core::error::{ParleyError, Result};
use parley_core::gateway::SyncGateway;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;

const EVENT_CAPACITY: usize = 64;

/// User-facing actions a session performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionAction {
    Send,
    Edit,
    Delete,
    Copy,
}

/// Notifications for a front-end that re-renders on change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TranscriptChanged,
    ComposingChanged(bool),
    ActionFailed {
        action: SessionAction,
        message: String,
    },
    Closed,
}

#[derive(Debug)]
struct SessionState {
    transcript: TranscriptStore,
    composing: ComposingIndicator,
    menu: ActionMenu,
}

/// Synchronization engine for the currently open conversation.
///
/// Cloning is cheap and every clone drives the same conversation, so a
/// front-end can hand clones to spawned tasks while the user keeps
/// interacting.
#[derive(Clone)]
pub struct ConversationSession {
    persona: Arc<str>,
    gateway: Arc<dyn SyncGateway>,
    policy: SyncPolicy,
    state: Arc<Mutex<SessionState>>,
    lifetime: CancellationToken,
    events: broadcast::Sender<SessionEvent>,
}

impl ConversationSession {
    /// Opens a conversation with `persona`, loading its transcript.
    ///
    /// Never fails: a failed fetch yields the placeholder conversation.
    pub async fn open(
        gateway: Arc<dyn SyncGateway>,
        persona: impl Into<String>,
        policy: SyncPolicy,
    ) -> Self {
        let persona: String = persona.into();
        let transcript = TranscriptStore::load(gateway.as_ref(), &persona).await;
        tracing::info!(
            "[ConversationSession] Opened '{}' with {} message(s)",
            persona,
            transcript.len()
        );
        Self::with_transcript(gateway, transcript, policy)
    }

    /// Wraps an already-built transcript.
    pub fn with_transcript(
        gateway: Arc<dyn SyncGateway>,
        transcript: TranscriptStore,
        policy: SyncPolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            persona: Arc::from(transcript.persona()),
            gateway,
            policy,
            state: Arc::new(Mutex::new(SessionState {
                transcript,
                composing: ComposingIndicator::new(),
                menu: ActionMenu::new(),
            })),
            lifetime: CancellationToken::new(),
            events,
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// Ends the session. In-flight calls are dropped and any response that
    /// would have arrived later is ignored.
    pub fn close(&self) {
        if !self.lifetime.is_cancelled() {
            tracing::debug!("[ConversationSession] Closing '{}'", self.persona);
            self.lifetime.cancel();
            self.emit(SessionEvent::Closed);
        }
    }

    // ============================================================================
    // Snapshots
    // ============================================================================

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().await.transcript.messages().to_vec()
    }

    pub async fn composing(&self) -> ComposingState {
        self.state.lock().await.composing.state()
    }

    /// `"<persona> is typing..."` while a reply is pending.
    pub async fn composing_label(&self) -> Option<String> {
        self.state.lock().await.composing.label(&self.persona)
    }

    pub async fn menu_state(&self) -> MenuState {
        self.state.lock().await.menu.state().clone()
    }

    // ============================================================================
    // Send
    // ============================================================================

    /// Sends a user turn and appends the persona's reply.
    ///
    /// Blank text is ignored (`Ok(None)`). Otherwise the user turn is appended
    /// before the call and the indicator goes `Waiting` until the call
    /// settles, including when it is cut short by [`close`](Self::close). On success the reply is appended and returned. On failure the
    /// user turn stays unless the divergence policy is `Rollback`.
    pub async fn send(&self, text: &str) -> Result<Option<ChatMessage>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let sent = {
            let mut state = self.state.lock().await;
            self.ensure_open()?;
            if state.composing.is_waiting() && self.policy.send_guard == SendGuard::Reject {
                tracing::debug!(
                    "[ConversationSession] Rejecting send to '{}': reply pending",
                    self.persona
                );
                return Err(ParleyError::SendInFlight {
                    persona: self.persona.to_string(),
                });
            }
            let sent = state.transcript.append_local(MessageRole::User, text);
            state.composing.begin();
            sent
        };
        self.emit(SessionEvent::TranscriptChanged);
        self.emit(SessionEvent::ComposingChanged(true));

        let outcome = self
            .bound(self.gateway.send_turn(&self.persona, text))
            .await;

        let mut state = self.state.lock().await;
        state.composing.settle();
        if self.is_closed() {
            drop(state);
            self.emit(SessionEvent::ComposingChanged(false));
            return Err(ParleyError::Cancelled);
        }

        let mut rolled_back = false;
        let result = match outcome {
            Ok(reply) => {
                let reply = state.transcript.confirm_remote_reply(reply);
                Ok(Some(reply))
            }
            Err(e) => {
                tracing::warn!("[ConversationSession] Error sending message: {}", e);
                match self.policy.divergence {
                    DivergencePolicy::Accept => tracing::debug!(
                        "[ConversationSession] Keeping unconfirmed user turn {}",
                        sent.id
                    ),
                    DivergencePolicy::Rollback => {
                        rolled_back = state.transcript.remove_by_id(&sent.id).is_some();
                        tracing::info!(
                            "[ConversationSession] Rolled back unconfirmed user turn {}",
                            sent.id
                        );
                    }
                }
                Err(e)
            }
        };
        drop(state);

        self.emit(SessionEvent::ComposingChanged(false));
        if rolled_back {
            self.emit(SessionEvent::TranscriptChanged);
        }
        self.settled(SessionAction::Send, result)
    }

    // ============================================================================
    // Action menu
    // ============================================================================

    /// Selects the message with `id` (long-press equivalent).
    pub async fn select(&self, id: &MessageId) -> Option<ChatMessage> {
        let mut state = self.state.lock().await;
        let message = state.transcript.get(id).cloned()?;
        state.menu.select(message.clone());
        Some(message)
    }

    /// Closes the menu or the edit dialog.
    pub async fn dismiss(&self) {
        self.state.lock().await.menu.dismiss();
    }

    /// Copies the selected message's content. No store mutation.
    pub async fn copy_selected(&self, clipboard: &dyn Clipboard) -> Result<Option<CopyNotice>> {
        let message = {
            let mut state = self.state.lock().await;
            self.ensure_open()?;
            state.menu.take(MenuAction::Copy)
        };
        let Some(message) = message else {
            return Ok(None);
        };

        let result = clipboard
            .set_text(&message.content)
            .map(|()| Some(CopyNotice::default()));
        self.settled(SessionAction::Copy, result)
    }

    /// Deletes the selected message remotely, then locally on success.
    ///
    /// The local removal matches on role and content, the same key the remote
    /// store uses. If no local message matches, nothing changes and
    /// `Ok(None)` is returned. On failure local state is left untouched.
    pub async fn delete_selected(&self) -> Result<Option<ChatMessage>> {
        let target = {
            let mut state = self.state.lock().await;
            self.ensure_open()?;
            state.menu.take(MenuAction::Delete)
        };
        let Some(target) = target else {
            return Ok(None);
        };

        let outcome = self
            .bound(self.gateway.delete_turn(&self.persona, &target))
            .await;

        let result = match outcome {
            Ok(()) => {
                let mut state = self.state.lock().await;
                self.ensure_open()?;
                let removed = state
                    .transcript
                    .remove_local(target.role, &target.content);
                if removed.is_none() {
                    tracing::warn!(
                        "[ConversationSession] No local {} message matches deleted content",
                        target.role
                    );
                }
                Ok(removed)
            }
            Err(e) => {
                tracing::warn!("[ConversationSession] Error deleting message: {}", e);
                Err(e)
            }
        };

        if matches!(result, Ok(Some(_))) {
            self.emit(SessionEvent::TranscriptChanged);
        }
        self.settled(SessionAction::Delete, result)
    }

    /// `Selected → EditOpen`; returns the draft seeded with the current content.
    pub async fn begin_edit(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .menu
            .open_edit()
            .map(str::to_string)
    }

    /// Replaces the draft of the open edit. Returns `false` if none is open.
    pub async fn set_draft(&self, text: impl Into<String>) -> bool {
        self.state.lock().await.menu.set_draft(text)
    }

    /// Confirms the open edit.
    ///
    /// The local content is replaced immediately, before the remote call
    /// settles. If the call fails the new content stays, unless the
    /// divergence policy is `Rollback`, in which case the previous content is
    /// restored (only if nothing has edited the message since). A blank draft
    /// is ignored and keeps the edit open.
    pub async fn confirm_edit(&self) -> Result<Option<ChatMessage>> {
        let (original, draft, previous) = {
            let mut state = self.state.lock().await;
            self.ensure_open()?;
            let Some((original, draft)) = state.menu.confirm_edit() else {
                return Ok(None);
            };
            let previous = state.transcript.edit_local(&original.id, draft.clone());
            (original, draft, previous)
        };
        if previous.is_some() {
            self.emit(SessionEvent::TranscriptChanged);
        }

        let outcome = self
            .bound(self.gateway.edit_turn(&self.persona, &original, &draft))
            .await;

        let result = match outcome {
            Ok(()) => Ok(Some(ChatMessage::new(
                original.id.clone(),
                original.role,
                draft,
            ))),
            Err(e) => {
                tracing::warn!("[ConversationSession] Error editing message: {}", e);
                match (self.policy.divergence, previous) {
                    (DivergencePolicy::Rollback, Some(previous)) => {
                        self.rollback_edit(&original.id, &draft, previous).await?;
                    }
                    _ => tracing::debug!(
                        "[ConversationSession] Keeping unconfirmed edit of {}",
                        original.id
                    ),
                }
                Err(e)
            }
        };

        self.settled(SessionAction::Edit, result)
    }

    async fn rollback_edit(&self, id: &MessageId, draft: &str, previous: String) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_open()?;
        let untouched = state.transcript.get(id).is_some_and(|m| m.content == draft);
        if untouched {
            state.transcript.edit_local(id, previous);
            drop(state);
            tracing::info!("[ConversationSession] Rolled back unconfirmed edit of {}", id);
            self.emit(SessionEvent::TranscriptChanged);
        }
        Ok(())
    }

    // ============================================================================
    // Helpers
    // ============================================================================

    fn ensure_open(&self) -> Result<()> {
        if self.lifetime.is_cancelled() {
            Err(ParleyError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Races a gateway call against the session lifetime.
    async fn bound<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.lifetime.cancelled() => Err(ParleyError::Cancelled),
            result = call => result,
        }
    }

    /// Emits the success/failure notifications shared by all actions.
    fn settled<T>(&self, action: SessionAction, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) if action == SessionAction::Send => self.emit(SessionEvent::TranscriptChanged),
            Ok(_) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => self.emit(SessionEvent::ActionFailed {
                action,
                message: e.to_string(),
            }),
        }
        result
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
