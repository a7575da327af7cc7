//! Signal handling for graceful shutdown.
//!
//! Resolves when the process receives a termination signal so the host can
//! stop reading requests and drain the engine.

use std::future::Future;
use tokio::signal;
use tracing::{info, warn};

/// Waits for a termination signal.
///
/// # Platform Support
///
/// * **Unix platforms**: Handles SIGINT and SIGTERM signals
/// * **Windows**: Handles Ctrl+C signal
///
/// # Returns
///
/// `Ok(())` when a shutdown signal is received, or an error if signal
/// handling setup failed.
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("📡 Received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("📡 Received SIGTERM");
            }
        }
    }

    #[cfg(windows)]
    {
        signal::ctrl_c().await?;
        info!("📡 Received Ctrl+C");
    }

    Ok(())
}

/// Resolves once a shutdown signal arrives.
///
/// If the signal handlers cannot be installed the failure is logged and this
/// never resolves, leaving the host to run until its input ends.
pub async fn shutdown_requested() {
    settle_signal(wait_for_shutdown_signal()).await
}

async fn settle_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("⚠️ Signal handling unavailable, serving until input ends: {}", e);
        std::future::pending::<()>().await;
    }
}
