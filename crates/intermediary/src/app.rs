//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that orchestrates startup
//! (engine handshake, listener), waits for a shutdown signal and tears the
//! server down in phases.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    signals::{wait_for_shutdown_signal, wait_for_signal},
};
use engine_server::{create_server_with_config, EngineServer, ShutdownState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// How long the server task gets to leave its accept loop.
const SERVER_STOP_TIMEOUT: Duration = Duration::from_secs(8);

/// The running intermediary: merged configuration plus the server built
/// from it.
pub struct Application {
    config: AppConfig,
    server: Arc<EngineServer>,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration with CLI overrides already applied
    ///
    /// # Returns
    ///
    /// A configured `Application` ready to run, or an error if the
    /// configuration is invalid or the TLS material cannot be loaded.
    ///
    /// # Process
    ///
    /// 1. Validate the merged configuration
    /// 2. Display the startup banner
    /// 3. Build the server (auth policy, engine registration, TLS)
    pub fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let server_config = config.to_server_config()?;
        let server = create_server_with_config(server_config)?;

        Ok(Self {
            config,
            server: Arc::new(server),
        })
    }

    /// Loads the configuration named by `args` (or the defaults) and merges
    /// the CLI overrides into it.
    pub async fn load_config(args: &CliArgs) -> Result<AppConfig, Box<dyn std::error::Error>> {
        let mut config = match &args.config_path {
            Some(path) => AppConfig::load_from_file(path).await?,
            None => AppConfig::default(),
        };
        config.apply_cli_overrides(args);
        Ok(config)
    }

    /// Runs the application until a shutdown signal arrives.
    ///
    /// # Returns
    ///
    /// `Ok(())` after a graceful shutdown, or an error if the engine could
    /// not be started. A listener that cannot be bound exits the process.
    ///
    /// # Shutdown Phases
    ///
    /// 1. Stop accepting connections
    /// 2. Wait for the server task to leave its accept loop
    /// 3. Stop the engine process
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Chesshook Intermediary");
        self.log_configuration_summary();

        info!("♟️ Starting engine: {}", self.config.engine_path);
        self.server.start_engine().await?;
        info!(
            "♟️ Engine ready: {}",
            self.server.engine_manager().engine_name().await
        );

        let shutdown_state = ShutdownState::new();

        let server_handle = {
            let server = self.server.clone();
            let shutdown_state = shutdown_state.clone();
            tokio::spawn(async move {
                match server.start_with_shutdown_state(shutdown_state).await {
                    Ok(()) => info!("✅ Server completed successfully"),
                    Err(e) => {
                        error!("❌ Server error: {:?}", e);
                        std::process::exit(1);
                    }
                }
            })
        };

        info!("✅ Intermediary is now running!");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        wait_for_shutdown_signal(&shutdown_state).await?;

        // merciless shutdown
        tokio::spawn(async move {
            if let Err(e) = wait_for_signal().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        info!("📡 Phase 1: Stopping new connections...");
        info!("⏳ Phase 2: Waiting for the accept loop to stop...");
        match tokio::time::timeout(SERVER_STOP_TIMEOUT, server_handle).await {
            Ok(_) => info!("✅ Server task completed gracefully"),
            Err(_) => warn!("⏰ Server task did not complete within timeout, proceeding with cleanup"),
        }

        info!("🔌 Phase 3: Stopping the engine...");
        self.server.stop_engines().await;
        shutdown_state.complete_shutdown();

        info!("✅ Intermediary shutdown complete");
        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        let scheme = if self.config.tls { "wss" } else { "ws" };
        info!("📋 Configuration Summary:");
        info!("  🌐 Listen address: {}://{}", scheme, self.config.address);
        info!(
            "  ♟️ Engine: {} ({})",
            self.config.engine_path, self.config.family
        );
        info!(
            "  ⚙️ MultiPV {} | Threads {} | Hash {} MB",
            self.config.multipv, self.config.threads, self.config.hash
        );
        info!(
            "  🔐 Auth for writes: {} | reads: {} | localhost bypass: {}",
            self.config.auth_write, self.config.auth_read, self.config.localhost_bypass
        );
        info!("  🔒 Engine lock enforced: {}", self.config.enforce_engine_lock);
        info!("  🧠 Intelligence: {}", self.config.intelligence_enabled);
    }

    pub fn server(&self) -> &Arc<EngineServer> {
        &self.server
    }
}
