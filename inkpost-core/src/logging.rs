//! Logging setup
//!
//! Inkpost logs through the standard `log` facade; this module installs
//! `env_logger` as the backend once per process. Use the usual macros
//! (`log::info!`, `log::warn!`, ...) everywhere else.
//!
//! ```rust,no_run
//! use inkpost_core::config::LoggingConfig;
//!
//! inkpost_core::logging::init_logging(&LoggingConfig::default()).unwrap();
//! log::info!("Router ready");
//! ```

use crate::config::LoggingConfig;
use anyhow::anyhow;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Install the global logger. Safe to call multiple times; only the first
/// call takes effect.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level: log::LevelFilter =
        config.level.parse().map_err(|_| anyhow!("Invalid log level '{}'", config.level))?;
    let json = config.format == "json";

    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(level);
        if json {
            builder.format(|buf, record| {
                let line = serde_json::json!({
                    "ts": chrono::Utc::now().to_rfc3339(),
                    "level": record.level().as_str(),
                    "target": record.target(),
                    "msg": record.args().to_string(),
                });
                writeln!(buf, "{}", line)
            });
        }
        // Another logger may already be installed (tests, embedding apps)
        let _ = builder.try_init();
    });

    Ok(())
}
