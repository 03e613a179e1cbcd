//! Navigation guard configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Navigation guard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// How long a navigation waits for the session to settle
    /// Env: INKPOST_GUARD_READY_TIMEOUT_MS
    /// Default: 1000
    pub ready_timeout_ms: u64,

    /// Where unauthenticated users are sent
    /// Env: INKPOST_GUARD_LOGIN_ROUTE
    /// Default: /auth/login
    pub login_route: String,

    /// Where signed-in users leaving auth pages and forbidden users are sent
    /// Env: INKPOST_GUARD_DEFAULT_ROUTE
    /// Default: /
    pub default_route: String,

    /// Append `?redirect=<path>` to login redirects
    /// Env: INKPOST_GUARD_PRESERVE_DESTINATION
    /// Default: false
    pub preserve_destination: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: 1000,
            login_route: "/auth/login".to_string(),
            default_route: "/".to_string(),
            preserve_destination: false,
        }
    }
}

impl GuardConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_preserve_destination(mut self, enabled: bool) -> Self {
        self.preserve_destination = enabled;
        self
    }

    pub fn merge(&mut self, other: Self) {
        self.ready_timeout_ms = other.ready_timeout_ms;
        self.login_route = other.login_route;
        self.default_route = other.default_route;
        self.preserve_destination = other.preserve_destination;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(timeout) = env::var("INKPOST_GUARD_READY_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.ready_timeout_ms = t;
            }
        }

        if let Ok(route) = env::var("INKPOST_GUARD_LOGIN_ROUTE") {
            self.login_route = route;
        }

        if let Ok(route) = env::var("INKPOST_GUARD_DEFAULT_ROUTE") {
            self.default_route = route;
        }

        if let Ok(preserve) = env::var("INKPOST_GUARD_PRESERVE_DESTINATION") {
            self.preserve_destination = preserve.parse().unwrap_or(false);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ready_timeout_ms == 0 {
            bail!("Invalid ready_timeout_ms: must be greater than 0");
        }

        if !self.login_route.starts_with('/') {
            bail!("Invalid login_route '{}': must start with /", self.login_route);
        }

        if !self.default_route.starts_with('/') {
            bail!("Invalid default_route '{}': must start with /", self.default_route);
        }

        if self.login_route == self.default_route {
            bail!("Invalid guard routes: login_route and default_route must differ");
        }

        Ok(())
    }
}
