//! Configuration model for Parley.
//!
//! Loading (file + environment) lives in `parley-infrastructure`; this module
//! only defines the shape and defaults.

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// What happens to an optimistic local mutation when its remote call fails.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DivergencePolicy {
    /// Keep the local change; local and remote state may diverge.
    #[default]
    Accept,
    /// Undo the local change: drop an unsent user turn, restore edited content.
    Rollback,
}

/// What happens to a send issued while a reply is still pending.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SendGuard {
    /// Refuse with `ParleyError::SendInFlight`, leaving the transcript untouched.
    #[default]
    Reject,
    /// Let overlapping sends through unguarded.
    Permit,
}

/// Policies applied by a conversation session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPolicy {
    #[serde(default)]
    pub divergence: DivergencePolicy,
    #[serde(default)]
    pub send_guard: SendGuard,
}

/// Root configuration (`~/.config/parley/config.toml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParleyConfig {
    /// Base URL of the remote conversation store.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(flatten)]
    pub policy: SyncPolicy,
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_timeout_secs(),
            policy: SyncPolicy::default(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
