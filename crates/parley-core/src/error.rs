//! Error types for Parley.

use thiserror::Error;

/// A shared error type for the whole Parley workspace.
///
/// Variants fall into three groups:
/// - precondition errors raised locally before any request is attempted
///   (`MissingCredential`, `MissingPersona`, `SendInFlight`)
/// - remote errors reported by a single request/response exchange
///   (`Transport`, `Server`, `Serialization`)
/// - local infrastructure errors (`Config`, `Io`, `Clipboard`, `Internal`)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParleyError {
    /// No bearer token is available from the credential provider.
    #[error("User not authenticated")]
    MissingCredential,

    /// The persona identifier is empty.
    #[error("Persona name is missing")]
    MissingPersona,

    /// A send was issued while another reply is still outstanding.
    #[error("A reply from {persona} is still pending")]
    SendInFlight { persona: String },

    /// The request never produced an HTTP response (connect, timeout, body read).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote store answered with a non-2xx status.
    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// The conversation was closed before the call settled.
    #[error("Conversation closed before the request settled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Clipboard collaborator failed.
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Server error
    pub fn server(status: u16, body: impl Into<String>) -> Self {
        Self::Server {
            status,
            body: body.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// True for errors raised locally before any network call.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential | Self::MissingPersona | Self::SendInFlight { .. }
        )
    }

    /// True for failures reported by the remote exchange itself.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Server { .. } | Self::Serialization { .. }
        )
    }

    /// Check if this is a Server error with a 401 status or a missing credential.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::MissingCredential => true,
            Self::Server { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// Check if this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ParleyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ParleyError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ParleyError>`.
pub type Result<T> = std::result::Result<T, ParleyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(ParleyError::MissingCredential.is_precondition());
        assert!(ParleyError::MissingPersona.is_precondition());
        assert!(
            ParleyError::SendInFlight {
                persona: "Mira".to_string()
            }
            .is_precondition()
        );
        assert!(!ParleyError::transport("refused").is_precondition());
        assert!(ParleyError::server(500, "boom").is_remote());
    }

    #[test]
    fn test_unauthorized_detection() {
        assert!(ParleyError::MissingCredential.is_unauthorized());
        assert!(ParleyError::server(401, "Invalid token").is_unauthorized());
        assert!(!ParleyError::server(404, "User not found").is_unauthorized());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: ParleyError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        match err {
            ParleyError::Serialization { format, .. } => assert_eq!(format, "JSON"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
