//! # EasyTravel Administration Tool
//!
//! Offline maintenance of the TravelPort file used by the EasyTravel
//! plugin, sharing its configuration file and its registry rules.
//!
//! ## Quick Start
//!
//! ```bash
//! # List every port, or those whose name contains "spawn"
//! easytravel list
//! easytravel list spawn --json
//!
//! # Inspect and repair links
//! easytravel check
//! easytravel unlink Harbour
//! easytravel link 0 Harbour
//!
//! # Timed departures
//! easytravel departure Spawn every 2h
//! easytravel departure Harbour 07:30,18:00
//! ```
//!
//! ## Configuration
//!
//! The tool reads `easytravel.toml` (or the file given with `--config`).
//! If the file doesn't exist, a default configuration will be created.

use tracing::error;

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Entry point of the `easytravel` binary.
///
/// 1. Command-line argument parsing
/// 2. Logging system initialization from the configuration file
/// 3. Application creation and command execution
///
/// # Exit Codes
///
/// * **0**: The command succeeded
/// * **1**: Error during configuration, loading or the command itself
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging settings come from the file, before the full validation
    let mut logging = AppConfig::load_from_file(&args.config_path)
        .unwrap_or_default()
        .logging;
    if let Some(level) = &args.log_level {
        logging.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args) {
        Ok(mut app) => {
            let stdout = std::io::stdout();
            if let Err(e) = app.run(&mut stdout.lock()) {
                error!("❌ {e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use config::LoggingSettings;
