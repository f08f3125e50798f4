//! Unified path management for parley configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/parley/
//! ├── config.toml   # API URL, timeout, sync policies
//! └── token         # Bearer token written by the sign-in flow
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct ParleyPaths;

impl ParleyPaths {
    /// Returns the parley configuration directory (e.g., `~/.config/parley/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        let home = dirs::home_dir().ok_or(PathError::HomeDirNotFound)?;
        Ok(home.join(".config").join("parley"))
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the token file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600).
    pub fn token_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("token"))
    }
}
