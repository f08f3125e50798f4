//! Configuration loading.
//!
//! Priority (later wins):
//! 1. Built-in defaults
//! 2. `~/.config/parley/config.toml` (or an explicit path)
//! 3. Environment variables (`PARLEY_API_URL`, `PARLEY_TIMEOUT_SECS`,
//!    `PARLEY_DIVERGENCE`, `PARLEY_SEND_GUARD`)

use crate::paths::ParleyPaths;
use parley_core::config::{DivergencePolicy, ParleyConfig, SendGuard};
use parley_core::error::{ParleyError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_URL_ENV_VAR: &str = "PARLEY_API_URL";
pub const TIMEOUT_ENV_VAR: &str = "PARLEY_TIMEOUT_SECS";
pub const DIVERGENCE_ENV_VAR: &str = "PARLEY_DIVERGENCE";
pub const SEND_GUARD_ENV_VAR: &str = "PARLEY_SEND_GUARD";

pub struct ConfigService {
    path: Option<PathBuf>,
}

impl ConfigService {
    /// Uses `~/.config/parley/config.toml`.
    pub fn new_default() -> Self {
        let path = match ParleyPaths::config_file() {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("[ConfigService] Config file path unavailable: {}", e);
                None
            }
        };
        Self { path }
    }

    /// Uses an explicit config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Loads the file (if present) and applies the process environment on top.
    pub fn load(&self) -> Result<ParleyConfig> {
        let env: HashMap<String, String> = std::env::vars().collect();
        self.load_with_env(&env)
    }

    /// Same as [`load`](Self::load) with an explicit environment map.
    pub fn load_with_env(&self, env: &HashMap<String, String>) -> Result<ParleyConfig> {
        let mut config = match &self.path {
            Some(path) if path.exists() => read_config_file(path)?,
            Some(path) => {
                tracing::debug!(
                    "[ConfigService] No config file at {}, using defaults",
                    path.display()
                );
                ParleyConfig::default()
            }
            None => ParleyConfig::default(),
        };

        apply_env_overrides(&mut config, env)?;

        tracing::debug!(
            "[ConfigService] api_url={}, timeout={}s, divergence={}, send_guard={}",
            config.api_url,
            config.request_timeout_secs,
            config.policy.divergence,
            config.policy.send_guard
        );

        Ok(config)
    }
}

fn read_config_file(path: &Path) -> Result<ParleyConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ParleyError::io(format!(
            "Failed to read configuration file at {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(toml::from_str(&content)?)
}

fn apply_env_overrides(config: &mut ParleyConfig, env: &HashMap<String, String>) -> Result<()> {
    if let Some(url) = env.get(API_URL_ENV_VAR).filter(|v| !v.trim().is_empty()) {
        config.api_url = url.trim().to_string();
    }

    if let Some(raw) = env.get(TIMEOUT_ENV_VAR) {
        config.request_timeout_secs = raw.trim().parse().map_err(|_| {
            ParleyError::config(format!(
                "{} must be a number of seconds, got '{}'",
                TIMEOUT_ENV_VAR, raw
            ))
        })?;
    }

    if let Some(raw) = env.get(DIVERGENCE_ENV_VAR) {
        config.policy.divergence = raw.trim().parse::<DivergencePolicy>().map_err(|_| {
            ParleyError::config(format!(
                "{} must be 'accept' or 'rollback', got '{}'",
                DIVERGENCE_ENV_VAR, raw
            ))
        })?;
    }

    if let Some(raw) = env.get(SEND_GUARD_ENV_VAR) {
        config.policy.send_guard = raw.trim().parse::<SendGuard>().map_err(|_| {
            ParleyError::config(format!(
                "{} must be 'reject' or 'permit', got '{}'",
                SEND_GUARD_ENV_VAR, raw
            ))
        })?;
    }

    Ok(())
}
