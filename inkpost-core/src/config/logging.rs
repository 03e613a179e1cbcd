//! Logging configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Env: INKPOST_LOG_LEVEL
    pub level: String,
    /// "text" or "json"
    /// Env: INKPOST_LOG_FORMAT
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "text".to_string() }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("INKPOST_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("INKPOST_LOG_FORMAT") {
            self.format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.level.parse::<log::LevelFilter>().is_err() {
            bail!("Invalid log level '{}'", self.level);
        }
        if !["text", "json"].contains(&self.format.as_str()) {
            bail!("Invalid log format '{}': must be text or json", self.format);
        }
        Ok(())
    }
}
