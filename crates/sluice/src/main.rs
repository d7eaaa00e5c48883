//! Sluice - Stream ingestion and batch-commit pipeline
//!
//! # Usage
//!
//! ```bash
//! # Validate a config file and its cluster layout
//! sluice check --config configs/sluice.toml
//!
//! # Push a JSON-lines file through the pipeline without touching ClickHouse
//! sluice replay events.jsonl --dry-run
//! ```

mod cmd;
mod processor;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sluice_config::{Config, LogConfig, LogFormat};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Sluice - Stream ingestion and batch-commit pipeline
#[derive(Parser, Debug)]
#[command(name = "sluice")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, default_value = "configs/sluice.toml", global = true)]
    config: PathBuf,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate configuration and print the storage layout
    Check(cmd::check::CheckArgs),

    /// Replay a JSON-lines file through the pipeline
    Replay(cmd::replay::ReplayArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    init_logging(&config.log, cli.log_level.as_deref())?;

    match cli.command {
        Command::Check(args) => cmd::check::run(args, &config),
        Command::Replay(args) => cmd::replay::run(args, &config).await,
    }
}

/// Initialize the tracing subscriber for logging
///
/// `RUST_LOG` wins over both the CLI override and `[log] level`.
fn init_logging(log: &LogConfig, level_override: Option<&str>) -> Result<()> {
    let level = level_override.unwrap_or(log.level.as_str());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Console => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .init(),
    }

    Ok(())
}
