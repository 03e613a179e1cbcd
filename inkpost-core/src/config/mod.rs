//! Configuration system for Inkpost
//!
//! Values are resolved in the following order (highest priority wins):
//!
//! 1. **Code** (builder methods)
//! 2. **Environment variables** (`INKPOST_*`)
//! 3. **Config file** (`inkpost.toml`)
//! 4. **Defaults**
//!
//! # Example
//!
//! ```no_run
//! use inkpost_core::config::InkpostConfig;
//!
//! let config = InkpostConfig::load()?;
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod auth;
pub mod guard;
pub mod logging;
pub mod roles;

pub use auth::AuthConfig;
pub use guard::GuardConfig;
pub use logging::LoggingConfig;
pub use roles::RolesConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name
pub const CONFIG_FILE: &str = "inkpost.toml";

/// Complete Inkpost configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InkpostConfig {
    pub auth: AuthConfig,
    pub guard: GuardConfig,
    pub roles: RolesConfig,
    pub logging: LoggingConfig,
}

impl InkpostConfig {
    /// Load defaults, then `inkpost.toml`, then environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration using a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.auth.merge(other.auth);
        self.guard.merge(other.guard);
        self.roles.merge(other.roles);
        self.logging.merge(other.logging);
    }

    pub fn apply_env_vars(&mut self) {
        self.auth.apply_env_vars();
        self.guard.apply_env_vars();
        self.roles.apply_env_vars();
        self.logging.apply_env_vars();
    }

    pub fn validate(&self) -> Result<()> {
        self.auth.validate()?;
        self.guard.validate()?;
        self.roles.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Replace the guard section
    pub fn with_guard(mut self, guard: GuardConfig) -> Self {
        self.guard = guard;
        self
    }

    /// Replace the auth section
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }
}
