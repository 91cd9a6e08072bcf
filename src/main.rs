//! dispatch-core server
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (axum, tower layers)
//!                         │
//!                         ▼
//!                     adapter ──▶ Message
//!                                   │
//!                                   ▼
//!                     routing (route tree, params, fallback)
//!                                   │
//!                                   ▼
//!                     pipeline: prehandle → handle → posthandle
//!                                   │          ↘ catch (catchers)
//!                                   ▼
//!                               postcatch
//!                                   │
//!     Client Response               ▼
//!     ◀────────────── adapter ◀── Message.response
//!
//!     Cross-cutting: config (+ watcher), scope (providers), observability, lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dispatch_core::config::{load_config, ServerConfig};
use dispatch_core::config::watcher::ConfigWatcher;
use dispatch_core::http::HttpServer;
use dispatch_core::lifecycle::{shutdown_signal, Shutdown};
use dispatch_core::observability::{logging, metrics};
use dispatch_core::scope::Registry;

#[derive(Parser)]
#[command(name = "dispatch-core")]
#[command(about = "Route-tree request dispatcher", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload routes when the configuration file changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dispatch-core starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
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

    // The watcher must outlive the server.
    let (_watcher, updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), Some(updates))
        }
        _ => (None, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, Registry::with_builtins())?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    server.run(listener, updates, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
