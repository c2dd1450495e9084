//! # Polygon Region Host - Main Entry Point
//!
//! Runs a [`region_engine::RegionEngine`] as a standalone process: loads the
//! region file, autosaves it, reports health and saves once more on shutdown.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! polygon-region
//!
//! # Specify custom configuration and region file
//! polygon-region --config production.toml --regions /srv/world/regions.json
//!
//! # Validate a region file without starting
//! polygon-region --check --regions regions.json
//!
//! # JSON logging for production
//! polygon-region --json-logs --log-level debug
//! ```
//!
//! ## Configuration
//!
//! Settings come from a TOML file (default: `polygon_region.toml`), created
//! with defaults if missing.
//!
//! ## Signal Handling
//!
//! SIGINT and SIGTERM save the region file and exit. A second signal exits
//! immediately without saving.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Parses arguments, loads configuration, sets up logging and runs the host.
///
/// # Exit Codes
///
/// * **0**: Clean shutdown, or `--check` found a valid region file
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config = match AppConfig::load_from_file(&args.config_path).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "❌ Failed to load configuration from {}: {e}",
                args.config_path.display()
            );
            std::process::exit(1);
        }
    };

    let mut logging = config.logging.clone();
    if let Some(level) = &args.log_level {
        logging.level = level.clone();
    }
    if let Err(e) = logging::setup_logging(&logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    let app = match Application::new(&args, config).await {
        Ok(app) => app,
        Err(e) => {
            error!("❌ Failed to start region host: {e}");
            std::process::exit(1);
        }
    };

    if args.check {
        app.check();
        return Ok(());
    }

    if let Err(e) = app.run().await {
        error!("❌ Application error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

pub use config::{LoggingSettings, MonitoringSettings, StorageSettings};
