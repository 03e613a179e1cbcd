//! Inkpost CLI: inspect routes and navigation decisions.
//!
//! ```bash
//! inkpost routes
//! inkpost navigate --email ada@example.com --password secret-pw /dashboard /create-post
//! inkpost config
//! ```
//!
//! See `inkpost --help` for all available commands and options.

mod commands;

use clap::{Parser, Subcommand};
use inkpost_core::config::InkpostConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inkpost", about = "Inkpost route and session inspector", version)]
struct Cli {
    /// Configuration file (defaults to ./inkpost.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route table with each route's requirement
    Routes,

    /// Boot an in-memory backend and print the guard's decision for each path
    Navigate(commands::navigate::NavigateArgs),

    /// Print the effective configuration as TOML
    Config,
}

fn load_config(cli: &Cli) -> anyhow::Result<InkpostConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = InkpostConfig::default();
            config.merge(InkpostConfig::from_file(path)?);
            config.apply_env_vars();
            config
        }
        None => InkpostConfig::load()?,
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    inkpost_core::logging::init_logging(&config.logging)?;

    match cli.command {
        Commands::Routes => commands::routes::run(),
        Commands::Navigate(args) => commands::navigate::run(config, args).await,
        Commands::Config => commands::config::run(&config),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
