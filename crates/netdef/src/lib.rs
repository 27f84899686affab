//! # netdef - Network Definition Compiler
//!
//! Command-line front end for `netdef_core`. Loads a scene project, resolves
//! every networked object and writes the definition tree the networking
//! runtime reads at startup.
//!
//! ## Quick Start
//!
//! ```bash
//! # Compile with the default configuration (netdef.toml)
//! netdef --project game.json
//!
//! # Custom configuration and output directory
//! netdef -c build.toml -p game.json -o build/network_data
//!
//! # Resolve only, then check for updates
//! netdef -p game.json --dry-run --check-updates
//! ```
//!
//! ## Configuration
//!
//! Settings are loaded from a TOML file (default: `netdef.toml`). If the file
//! doesn't exist, a default configuration is created.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;

/// Runs the compiler once.
///
/// # Exit Codes
///
/// * **0**: Definitions written (or dry run completed)
/// * **1**: Error during startup, configuration or compilation, or any
///   object failed to compile
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging settings come from the config file, so load it first.
    let config = AppConfig::load_from_file(&args.config_path).await.unwrap_or_default();

    let mut logging_settings = config.logging.clone();
    if let Some(level) = &args.log_level {
        logging_settings.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&logging_settings, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    let app = match Application::new(args, config) {
        Ok(app) => app,
        Err(e) => {
            error!("❌ Failed to start application: {e}");
            std::process::exit(1);
        }
    };

    match app.run().await {
        Ok(summary) if summary.has_failures() => {
            error!("❌ Some definitions could not be written");
            std::process::exit(1);
        }
        Ok(_) => {}
        Err(e) => {
            error!("❌ Application error: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use app::{load_project, save_project, Application, RunSummary};
pub use cli::CliArgs;
pub use config::{AppConfig, LoggingSettings, OutputSettings, TemplateSettings, VersionCheckSettings};
