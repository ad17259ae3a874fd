//! guardd daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                        GUARDD                        │
//!   API request   │  ┌─────────┐   ┌──────────┐   ┌──────────────────┐   │
//!   ──────────────┼─▶│   api   │──▶│ registry │──▶│     control      │   │
//!                 │  │ server  │   │ + tiers  │   │    endpoints     │   │
//!                 │  └─────────┘   └──────────┘   └───┬──────────┬───┘   │
//!                 │                                   │          │       │
//!                 │                                   ▼          ▼       │
//!                 │                          ┌───────────┐ ┌───────────┐ │
//!                 │                          │ lifecycle │ │diagnostics│ │
//!                 │                          │controller │ │aggregator │ │
//!                 │                          └─────┬─────┘ └─────┬─────┘ │
//!                 │                                │             │       │
//!                 │               ┌────────────────┘             ▼       │
//!                 │               ▼                       ┌───────────┐  │
//!                 │  ┌──────────────────────┐             │  report   │  │
//!                 │  │ modules / updater    │             │  builder  │  │
//!                 │  └──────────────────────┘             └───────────┘  │
//!                 │                                                      │
//!                 │  status · resolver · observability · config          │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use guardd::config::{load_config, DaemonConfig};
use guardd::lifecycle::Daemon;
use guardd::observability::{logging, metrics, UnexpectedLogs};

#[derive(Parser)]
#[command(name = "guardd")]
#[command(about = "Network security daemon", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => DaemonConfig::default(),
    };

    let logs = UnexpectedLogs::new(config.observability.unexpected_log_capacity);
    logging::init(&config.observability.log_level, logs.clone());

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "guardd starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        api_keys = config.api.keys.len(),
        shutdown_timeout_secs = config.lifecycle.shutdown_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let daemon = Daemon::bring_up(&config, logs)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let reason = daemon.run(listener).await?;

    tracing::info!(reason = ?reason, exit_code = reason.exit_code(), "Shutdown complete");
    if reason.exit_code() != 0 {
        std::process::exit(reason.exit_code());
    }
    Ok(())
}
