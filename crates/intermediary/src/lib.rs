//! # Chesshook Intermediary - Main Entry Point
//!
//! Serves a UCI chess engine to WebSocket clients. This entry point handles
//! CLI parsing, configuration loading and application lifecycle management;
//! the protocol itself lives in the `engine_server` crate.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with defaults: ./stockfish on 127.0.0.1:8080
//! intermediary
//!
//! # Load a configuration file (JSON, or TOML by extension)
//! intermediary --config intermediary.json
//!
//! # Override specific settings
//! intermediary --addr 0.0.0.0:8080 --engine /usr/bin/lc0 --family leela --debug
//!
//! # Expose over TLS and require auth for reads too
//! intermediary --tls --cert cert.pem --key key.pem --authread
//! ```
//!
//! ## Configuration
//!
//! Without `--config` the built-in defaults are used. A named file that does
//! not exist is created with the defaults. Flags always override file values.
//!
//! ## Signal Handling
//!
//! The server handles graceful shutdown on:
//! - SIGINT (Ctrl+C)
//! - SIGTERM (Unix systems)
//!
//! A second signal during shutdown exits immediately with status 1.

use tracing::error;

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod signals;

pub use app::Application;
pub use cli::CliArgs;
pub use config::{AppConfig, ConfigError, ConfigFormat, LoggingSettings};

/// Main entry point for the intermediary.
///
/// Handles the complete application lifecycle including:
/// 1. Command-line argument parsing
/// 2. Configuration loading and merging
/// 3. Logging system initialization
/// 4. Application creation and execution
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging settings come from the merged configuration, so a broken file
    // is reported on stderr before the subscriber exists.
    let config = match Application::load_config(&args).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::setup_logging(&config.logging) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(config) {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}
