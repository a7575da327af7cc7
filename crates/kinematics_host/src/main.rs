//! Main application entry point for the kinematics host
//!
//! Loads configuration, starts the engine behind its bridge and serves
//! newline-delimited JSON requests from stdin or a file until the input ends
//! or a shutdown signal arrives.

mod cli;
mod config;
mod logging;
mod signals;
mod transport;

use cli::CliArgs;
use config::AppConfig;
use spatial_kinematics::EngineBridge;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{error, info};

// ============================================================================
// Application
// ============================================================================

/// Host application: configuration plus a running engine bridge
pub struct Application {
    config: AppConfig,
    input: Option<PathBuf>,
    bridge: EngineBridge,
}

impl Application {
    /// Loads configuration, initializes logging and starts the engine.
    pub async fn new(args: CliArgs) -> anyhow::Result<Self> {
        // Load configuration first (before logging setup)
        let mut config = AppConfig::load_from_file(&args.config_path).await?;
        config.apply_cli_overrides(&args);

        if let Err(e) = config.validate() {
            anyhow::bail!("Configuration validation failed: {}", e);
        }

        logging::setup_logging(&config.logging)?;

        let bridge = EngineBridge::spawn_with_timeout(config.engine.clone(), config.bridge.request_timeout())?;
        bridge.init(None).await?;

        info!("🚀 Kinematics Host v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "📂 Config: {} | Input: {}",
            args.config_path.display(),
            args.input
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "stdin".to_string())
        );

        Ok(Self {
            config,
            input: args.input,
            bridge,
        })
    }

    /// Serves requests until the input is exhausted or a signal arrives.
    pub async fn run(self) -> anyhow::Result<()> {
        info!("📋 Configuration Summary:");
        info!("  🗺️ Cell size: {}", self.config.engine.default_cell_size);
        info!("  💥 Collision radius: {}", self.config.engine.collision_radius);
        info!("  🧭 Path clearance: {}", self.config.engine.path_clearance);
        info!("  ⏱️ Request timeout: {}ms", self.config.bridge.request_timeout_ms);

        let reader = open_input(self.input.as_ref()).await?;
        let outcome = tokio::select! {
            served = transport::serve(&self.bridge, reader, tokio::io::stdout()) => Some(served),
            _ = signals::shutdown_requested() => {
                info!("🛑 Shutdown signal received, stopping request intake");
                None
            }
        };

        match outcome {
            Some(Ok(stats)) => info!(
                "📊 Served {} requests ({} errors, {} responses written)",
                stats.requests, stats.errors, stats.responses
            ),
            Some(Err(e)) => error!("❌ Transport error: {:?}", e),
            None => {}
        }

        let final_stats = self.bridge.stats().await.ok();
        self.bridge.shutdown().await?;

        if let Some(stats) = final_stats {
            info!(
                "📊 Engine handled {} requests ({} failed, {} panics caught)",
                stats.requests_handled, stats.requests_failed, stats.panics_caught
            );
        }
        info!("✅ Kinematics host shutdown complete");
        Ok(())
    }
}

async fn open_input(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let args = CliArgs::parse();

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("❌ Failed to start application: {:?}", e);
            std::process::exit(1);
        }
    }
}
