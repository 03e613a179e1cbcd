//! Role configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    /// Roles granted to a new identity and to any identity whose lookup fails
    /// Env: INKPOST_ROLES_DEFAULT (comma separated)
    /// Default: ["user"]
    pub default_roles: Vec<String>,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self { default_roles: vec!["user".to_string()] }
    }
}

impl RolesConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(roles) = env::var("INKPOST_ROLES_DEFAULT") {
            self.default_roles = roles
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_roles.iter().all(|r| r.trim().is_empty()) {
            bail!("Invalid default_roles: at least one role is required");
        }
        Ok(())
    }
}
