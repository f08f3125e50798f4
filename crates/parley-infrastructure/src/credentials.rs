//! Credential providers.
//!
//! Signing in happens elsewhere; these providers only hand an existing bearer
//! token to the gateway.
//!
//! Configuration priority used by [`default_credentials`]:
//! 1. `PARLEY_TOKEN` environment variable
//! 2. `~/.config/parley/token`

use crate::paths::ParleyPaths;
use async_trait::async_trait;
use parley_core::credential::CredentialProvider;
use std::path::PathBuf;
use std::sync::Arc;

pub const TOKEN_ENV_VAR: &str = "PARLEY_TOKEN";

/// A fixed token, typically injected by an embedding application.
#[derive(Clone)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// A provider that is never signed in.
    pub fn signed_out() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn bearer_token(&self) -> Option<String> {
        self.token.clone().filter(|t| !t.is_empty())
    }
}

/// Reads the token from an environment variable on every call.
#[derive(Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(TOKEN_ENV_VAR)
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn bearer_token(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// Reads the token from a file on every call, so a token refreshed by another
/// process is picked up without a restart.
#[derive(Clone)]
pub struct TokenFileCredentials {
    path: PathBuf,
}

impl TokenFileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialProvider for TokenFileCredentials {
    async fn bearer_token(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Some(content.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::debug!(
                    "[TokenFileCredentials] No token at {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }
}

/// Tries each provider in order and returns the first token found.
pub struct ChainedCredentials {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl ChainedCredentials {
    pub fn new(providers: Vec<Arc<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl CredentialProvider for ChainedCredentials {
    async fn bearer_token(&self) -> Option<String> {
        for provider in &self.providers {
            if let Some(token) = provider.bearer_token().await {
                return Some(token);
            }
        }
        None
    }
}

/// Environment first, then the token file in the config directory.
pub fn default_credentials() -> Arc<dyn CredentialProvider> {
    let mut providers: Vec<Arc<dyn CredentialProvider>> = vec![Arc::new(EnvCredentials::default())];
    match ParleyPaths::token_file() {
        Ok(path) => providers.push(Arc::new(TokenFileCredentials::new(path))),
        Err(e) => tracing::warn!("[Credentials] Token file unavailable: {}", e),
    }
    Arc::new(ChainedCredentials::new(providers))
}
