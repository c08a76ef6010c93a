//! `MazeBridge` relay: HTTP front for the maze game server.
//!
//! Lets the browser page talk to the TCP-only game server. Each HTTP request
//! becomes one command written over a fresh TCP connection; the game
//! server's reply is returned as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Listen on 0.0.0.0:3000, relay to localhost:12345
//! cargo run --bin mazebridge-relay
//!
//! # Custom addresses
//! cargo run --bin mazebridge-relay -- --bind 127.0.0.1:8080 --backend game.local:12345
//!
//! # Or via environment variables
//! MAZEBRIDGE_BACKEND=game.local:12345 cargo run --bin mazebridge-relay
//! ```

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use mazebridge_relay::backend::BackendClient;
use mazebridge_relay::config::{RelayCliArgs, RelayConfig};
use mazebridge_relay::server::{self, BridgeState};
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    let cli = RelayCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match RelayConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Held until exit so buffered file logs are flushed.
    let _log_guard = init_logging(&config.log_level, config.log_file.as_deref());

    tracing::info!(
        addr = %config.bind_addr,
        backend = %config.backend_addr,
        timeout_ms = config.backend_timeout.as_millis(),
        read_mode = ?config.read_mode,
        "starting mazebridge relay"
    );

    let backend = BackendClient::new(config.backend_config());
    let state = Arc::new(BridgeState::with_failure_status(
        backend,
        config.failure_status,
    ));

    match server::start_server_with_shutdown(&config.bind_addr, state, shutdown_signal()).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "relay listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "relay server task failed");
            }
            tracing::info!("relay stopped");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start relay");
            std::process::exit(1);
        }
    }
}

/// Initialize logging to stderr, or to `file_path` when given.
///
/// `RUST_LOG` takes precedence over `level`. Returns the appender's
/// [`WorkerGuard`] when logging to a file. `file_path` has already been
/// checked to name a file by [`RelayConfig::load`].
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some((log_dir, file_name)) = file_path.and_then(|p| Some((p.parent()?, p.file_name()?)))
    else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        return None;
    };

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
