//! Logging system setup and configuration
//!
//! Initializes the tracing subscriber. Output always goes to stderr because
//! stdout is reserved for protocol responses.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging system
///
/// # Arguments
/// * `settings` - Level and format from the configuration
///
/// # Environment Variables
/// * `RUST_LOG` - Override the configured filter (e.g., "debug", "spatial_kinematics=trace")
pub fn setup_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let registry = tracing_subscriber::registry().with(filter);

    if settings.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_thread_names(true),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    info!("🔧 Logging initialized with level: {}", settings.level);
    Ok(())
}
