//! Credential provider trait.
//!
//! Credential storage and login are handled outside Parley. The engine only
//! asks for the current bearer token right before each request.

/// Source of the bearer token attached to every remote call.
///
/// # Security Note
///
/// Implementations must never log the token or include it in error messages.
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns the current bearer token, or `None` when the user is not
    /// signed in. An empty token counts as absent.
    async fn bearer_token(&self) -> Option<String>;
}
