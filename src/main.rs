//! Logging reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                LOGGING PROXY                 │
//!                         │                                              │
//!     Client Request      │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│ forward  │───▶│ target  │──┼──▶ Upstream A / B
//!                         │  │ server  │    │ engine   │    │resolver │  │
//!                         │  └────┬────┘    └────┬─────┘    └─────────┘  │
//!                         │       │              │ POST                  │
//!                         │       ▼              ▼                       │
//!                         │  ┌─────────┐    ┌──────────┐                 │
//!     /health, /log ──────┼─▶│  admin  │───▶│  store   │ (bounded, 1000) │
//!                         │  └─────────┘    └──────────┘                 │
//!                         │                                              │
//!                         │  config · observability · security · lifecycle│
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use logging_proxy::config;
use logging_proxy::lifecycle::{startup, Shutdown};
use logging_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "logging-proxy")]
#[command(about = "Reverse proxy that records POST requests", long_about = None)]
struct Args {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = config::load(args.config.as_deref())?;
    logging::init(&config.observability);

    tracing::info!("logging-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    startup::run(config, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
