//! Reservation Engine Binary
//!
//! Starts the reservation engine daemon: wires the engine and runs the
//! expired-hold sweeper until shutdown.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin reservation-engine
//! ```
//!
//! # Environment Variables
//!
//! ## Optional
//! - `RESERVATION_CONFIG`: Path to a YAML config file (defaults apply
//!   when unset)
//! - `RUST_LOG`: Log level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use reservation_engine::{Engine, EngineConfig};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config()?;
    tracing::info!(
        hold_ttl_secs = config.reservation.hold_ttl_secs,
        sweep_interval_secs = config.sweeper.interval_secs,
        "Starting Reservation Engine"
    );

    let engine = Arc::new(Engine::new(&config));

    let shutdown_token = CancellationToken::new();
    let sweeper = spawn_sweeper(Arc::clone(&engine), &config, shutdown_token.clone());

    shutdown_signal().await;
    shutdown_token.cancel();
    sweeper.await.context("sweeper task panicked")?;

    tracing::info!("Reservation Engine stopped");
    Ok(())
}

#[allow(clippy::expect_used)]
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "reservation_engine=info"
                    .parse()
                    .expect("static directive 'reservation_engine=info' is valid"),
            ),
        )
        .init();
}

fn load_config() -> anyhow::Result<EngineConfig> {
    match std::env::var_os("RESERVATION_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            EngineConfig::load(&path)
                .with_context(|| format!("loading config from {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Run the expired-hold sweep on a fixed interval until cancelled.
fn spawn_sweeper(
    engine: Arc<Engine>,
    config: &EngineConfig,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let period = config.sweep_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!("Sweeper shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(err) = engine.sweep_expired_holds().await {
                        tracing::error!(error = %err, "Sweep pass failed");
                    }
                }
            }
        }
    })
}

/// Wait for Ctrl+C or SIGTERM.
///
/// # Panics
///
/// Panics if signal handlers cannot be installed; a process that cannot
/// respond to termination signals should fail fast at startup.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
