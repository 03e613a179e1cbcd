//! Identity provider configuration

use crate::identity::PersistenceMode;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Identity provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Session persistence: "local" (survives restart) or "session"
    /// Env: INKPOST_AUTH_PERSISTENCE
    /// Default: local
    pub persistence: PersistenceMode,

    /// File holding the restored identity when persistence is local
    /// Env: INKPOST_AUTH_SESSION_FILE
    /// Default: ./data/session.json
    pub session_file: String,

    /// Minimum password length accepted on sign-up
    /// Env: INKPOST_AUTH_MIN_PASSWORD_LENGTH
    /// Default: 6
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            persistence: PersistenceMode::Local,
            session_file: "./data/session.json".to_string(),
            min_password_length: 6,
        }
    }
}

impl AuthConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(mode) = env::var("INKPOST_AUTH_PERSISTENCE") {
            match mode.parse() {
                Ok(mode) => self.persistence = mode,
                Err(e) => log::warn!("Ignoring INKPOST_AUTH_PERSISTENCE: {}", e),
            }
        }

        if let Ok(path) = env::var("INKPOST_AUTH_SESSION_FILE") {
            self.session_file = path;
        }

        if let Ok(length) = env::var("INKPOST_AUTH_MIN_PASSWORD_LENGTH") {
            if let Ok(l) = length.parse() {
                self.min_password_length = l;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.persistence == PersistenceMode::Local && self.session_file.trim().is_empty() {
            bail!("Invalid session_file: required when persistence is local");
        }

        if self.min_password_length == 0 {
            bail!("Invalid min_password_length: must be greater than 0");
        }

        Ok(())
    }
}
