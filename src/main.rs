//! Elections API process.
//!
//! # Architecture Overview
//!
//! ```text
//!   HTTP client ──▶ http (request id → request logging → handlers)
//!                          │
//!                          ▼
//!   tracing events ──▶ logging::JsonLayer ──▶ logging::Emitter
//!                                               │
//!                       ┌───────────────────────┴───────────────┐
//!                       ▼                                       ▼
//!               logs/app.log (NDJSON)                    stdout (text)
//!                       │
//!                       ▼
//!        external collector ──▶ elections-logs-* indices ──▶ dashboards
//! ```
//!
//! Configuration: `--config <file>` or `ELECTIONS_CONFIG`; built-in defaults
//! otherwise (listen on 0.0.0.0:8000, INFO, `logs/app.log`).

use std::path::PathBuf;

use clap::Parser;

use elections_logs::config::{load_config, AppConfig};
use elections_logs::lifecycle::startup;

#[derive(Parser)]
#[command(name = "elections-api")]
#[command(about = "Elections API process with structured JSON logging", long_about = None)]
struct Cli {
    /// TOML configuration file (watched for log level changes)
    #[arg(short, long, env = "ELECTIONS_CONFIG")]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    startup::run(config, cli.config).await?;
    Ok(())
}
