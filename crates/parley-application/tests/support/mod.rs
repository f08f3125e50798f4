//! Scripted gateway and clipboard used by the conversation flow tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parley_core::clipboard::Clipboard;
use parley_core::conversation::ChatMessage;
use parley_core::error::{ParleyError, Result};
use parley_core::gateway::{RemoteMessage, SyncGateway};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(String),
    Send {
        persona: String,
        content: String,
    },
    Edit {
        persona: String,
        original: ChatMessage,
        new_content: String,
    },
    Delete {
        persona: String,
        message: ChatMessage,
    },
    List,
}

/// Gateway with canned results.
///
/// When built with [`held`](Self::held), every mutating call (send, edit,
/// delete) signals `entered` and then waits for a permit on `release`, so a
/// test can observe the optimistic state while the call is outstanding.
pub struct ScriptedGateway {
    transcript: Mutex<Result<Vec<RemoteMessage>>>,
    replies: Mutex<VecDeque<Result<String>>>,
    edit_result: Mutex<Result<()>>,
    delete_result: Mutex<Result<()>>,
    calls: Mutex<Vec<Call>>,
    hold: bool,
    pub entered: Semaphore,
    pub release: Semaphore,
}

impl ScriptedGateway {
    pub fn new(transcript: Vec<RemoteMessage>) -> Self {
        Self {
            transcript: Mutex::new(Ok(transcript)),
            replies: Mutex::new(VecDeque::new()),
            edit_result: Mutex::new(Ok(())),
            delete_result: Mutex::new(Ok(())),
            calls: Mutex::new(Vec::new()),
            hold: false,
            entered: Semaphore::new(0),
            release: Semaphore::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn failing_fetch(error: ParleyError) -> Self {
        let gateway = Self::empty();
        *gateway.transcript.lock().unwrap() = Err(error);
        gateway
    }

    pub fn held(mut self) -> Self {
        self.hold = true;
        self
    }

    pub fn reply(self, reply: Result<String>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn edit_result(self, result: Result<()>) -> Self {
        *self.edit_result.lock().unwrap() = result;
        self
    }

    pub fn delete_result(self, result: Result<()>) -> Self {
        *self.delete_result.lock().unwrap() = result;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Waits until a held call has started.
    pub async fn wait_entered(&self) {
        self.entered.acquire().await.unwrap().forget();
    }

    /// Lets `n` held calls finish.
    pub fn release(&self, n: usize) {
        self.release.add_permits(n);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn gate(&self) {
        if self.hold {
            self.entered.add_permits(1);
            self.release.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl SyncGateway for ScriptedGateway {
    async fn fetch_transcript(&self, persona: &str) -> Result<Vec<RemoteMessage>> {
        self.record(Call::Fetch(persona.to_string()));
        self.transcript.lock().unwrap().clone()
    }

    async fn send_turn(&self, persona: &str, content: &str) -> Result<String> {
        self.record(Call::Send {
            persona: persona.to_string(),
            content: content.to_string(),
        });
        self.gate().await;
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }

    async fn edit_turn(
        &self,
        persona: &str,
        original: &ChatMessage,
        new_content: &str,
    ) -> Result<()> {
        self.record(Call::Edit {
            persona: persona.to_string(),
            original: original.clone(),
            new_content: new_content.to_string(),
        });
        self.gate().await;
        self.edit_result.lock().unwrap().clone()
    }

    async fn delete_turn(&self, persona: &str, message: &ChatMessage) -> Result<()> {
        self.record(Call::Delete {
            persona: persona.to_string(),
            message: message.clone(),
        });
        self.gate().await;
        self.delete_result.lock().unwrap().clone()
    }

    async fn list_conversations(&self) -> Result<Vec<String>> {
        self.record(Call::List);
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct RecordingClipboard {
    pub contents: Mutex<Option<String>>,
    pub fail: bool,
}

impl Clipboard for RecordingClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        if self.fail {
            return Err(ParleyError::Clipboard("clipboard unavailable".to_string()));
        }
        *self.contents.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

pub fn remote(role: &str, content: &str) -> RemoteMessage {
    RemoteMessage::new(role, content)
}
