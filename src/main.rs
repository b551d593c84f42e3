//! # Top Stories
//!
//! A small service that keeps a ranked snapshot of the current top stories.
//!
//! ## Features
//!
//! - Fetches the top-stories identifier list from a Hacker News compatible API
//! - Resolves every item concurrently, one task per story, with a per-item timeout
//! - Derives each story's source domain from its URL
//! - Drops unusable items (no URL, fetch or decode failure) without failing the batch
//! - Ranks stories by score and publishes the snapshot as JSON and Markdown
//! - Refreshes on a fixed interval, keeping the last good snapshot when a cycle fails
//! - Serves the current snapshot over HTTP as Markdown and JSON
//!
//! ## Usage
//!
//! ```sh
//! top_stories -j ./json -m ./markdown -i 20 -n 30 -p 8000
//! ```
//!
//! ## Architecture
//!
//! Each refresh cycle is a pipeline:
//! 1. **Identifiers**: fetch the top-stories list and keep the first N
//! 2. **Fan-out**: fetch every item on its own task and derive its domain
//! 3. **Join**: wait for every task, collecting stories and failures
//! 4. **Rank**: sort by score, publish the snapshot, write outputs

use clap::Parser;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod batch;
mod cli;
mod config;
mod domain;
mod error;
mod models;
mod outputs;
mod rank;
mod scheduler;
mod server;
mod store;
mod utils;

use api::HttpTransport;
use cli::Cli;
use config::Config;
use scheduler::Scheduler;
use store::SnapshotStore;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "top_stories starting up");

    // Parse CLI and resolve configuration
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");
    let config = Config::resolve(&args)?;
    info!(
        api = %config.endpoints().base(),
        batch_size = config.batch_size,
        interval_secs = config.refresh_interval_secs,
        item_timeout_secs = config.item_timeout_secs,
        port = config.port,
        "Configuration loaded"
    );

    // Early check: ensure output dirs are writable
    let outputs = config.outputs();
    for dir in [&outputs.json, &outputs.markdown].into_iter().flatten() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e.into());
        }
    }
    if outputs.is_empty() {
        warn!("No output directory configured; snapshots will only be logged");
    }

    let transport = Arc::new(HttpTransport::new(config.http_timeout())?);
    let scheduler = Scheduler::new(transport, &config, Arc::new(SnapshotStore::new()));

    if args.once {
        let snapshot = scheduler.run_cycle().await?;
        info!(
            stories = snapshot.len(),
            dropped = snapshot.dropped(),
            elapsed_ms = snapshot.elapsed_ms,
            "Single refresh complete"
        );
        return Ok(());
    }

    // HTTP server runs next to the refresh loop and stops after it
    let (shutdown_tx, mut shutdown_rx) = watch::channel(());
    let server = if config.port == 0 {
        info!("HTTP server disabled (port 0)");
        None
    } else {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await?;
        let store = Arc::clone(scheduler.store());
        Some(tokio::spawn(server::serve(listener, store, async move {
            shutdown_rx.changed().await.ok();
            info!("HTTP server shutting down");
        })))
    };

    let cycles = scheduler
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Could not listen for Ctrl-C; stopping");
            }
        })
        .await;

    let _ = shutdown_tx.send(());
    if let Some(server) = server {
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "HTTP server error"),
            Err(e) => error!(error = %e, "HTTP server task failed"),
        }
    }

    info!(cycles, "Execution complete");
    Ok(())
}
