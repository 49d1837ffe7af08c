//! API guard server.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────────┐
//!                      │                     API GUARD                      │
//!   Client Request     │  ┌─────────┐   ┌─────────┐   ┌────────────────┐   │
//!   ───────────────────┼─▶│ routing │──▶│ policy  │──▶│ guard pipeline │   │
//!                      │  │  table  │   │  table  │   │ auth → level → │   │
//!                      │  └─────────┘   └─────────┘   │ key → method   │   │
//!                      │                              └───────┬────────┘   │
//!                      │        ┌──────────────┐              │            │
//!                      │        │  credential  │◀─────────────┤            │
//!                      │        │  key store   │              ▼            │
//!                      │        └──────────────┘      ┌──────────────┐     │
//!   Client Response    │  ┌────────────────────┐      │  log store   │     │
//!   ◀──────────────────┼──│ response / handler │◀─────│ count/append │     │
//!                      │  └────────────────────┘      └──────────────┘     │
//!                      │                                                   │
//!                      │  config (+ hot reload) · observability · admin    │
//!                      └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use api_guard::config::loader::load_config;
use api_guard::config::watcher::ConfigWatcher;
use api_guard::config::GuardConfig;
use api_guard::lifecycle::signals::shutdown_signal;
use api_guard::observability::{logging, metrics};
use api_guard::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "api-guard", version, about = "API key guard with sliding-window rate limits")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "API_GUARD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("api-guard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        credentials = config.keys.len(),
        logging = config.guard.logging,
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

    // Hot reload; the watcher must outlive the server
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
