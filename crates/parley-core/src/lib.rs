pub mod clipboard;
pub mod config;
pub mod conversation;
pub mod credential;
pub mod error;
pub mod gateway;

// Re-export common error type
pub use error::{ParleyError, Result};
