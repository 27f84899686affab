//! Logging system setup.
//!
//! Initializes `tracing-subscriber` with either human-readable or JSON
//! output. `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global subscriber.
///
/// # Arguments
///
/// * `config` - Logging configuration from the config file
/// * `json_format` - Forces JSON output (CLI override)
pub fn setup_logging(config: &LoggingSettings, json_format: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = config.level.as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if json_format || config.json_format {
        registry
            .with(fmt::layer().json().with_file(false).with_line_number(false).with_thread_names(true))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_ansi(true).with_target(false).with_thread_names(true))
            .try_init()?;
    }

    info!("🔧 Logging initialized with level: {}", log_level);
    Ok(())
}
