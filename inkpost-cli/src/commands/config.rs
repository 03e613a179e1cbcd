use anyhow::Result;
use inkpost_core::config::InkpostConfig;

/// Print the effective configuration.
pub fn run(config: &InkpostConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
