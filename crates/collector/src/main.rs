//! eventlog - Event log pipeline command line
//!
//! # Usage
//!
//! ```bash
//! # Replay a JSON-lines file of events through the pipeline
//! eventlog replay events.jsonl
//! eventlog replay events.jsonl --queued --config configs/eventlog.toml
//!
//! # Validate a configuration file and print the effective settings
//! eventlog check --config configs/eventlog.toml
//! ```

mod cmd;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eventlog_config::Config;

/// eventlog - Event log ingestion and retention pipeline
#[derive(Parser, Debug)]
#[command(name = "eventlog")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay events from a JSON-lines file through the pipeline
    Replay(cmd::replay::ReplayArgs),

    /// Validate configuration and print the effective settings
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init(&config.log, cli.log_level.as_deref())?;

    match cli.command {
        Command::Replay(args) => cmd::replay::run(config, args).await,
        Command::Check => cmd::check::run(&config, cli.config.as_deref()),
    }
}

/// Load configuration, or defaults when no path is given
fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}
