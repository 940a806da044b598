//! Utility functions and helper methods for the engine server.
//!
//! This module provides convenient factory functions for creating server
//! instances with different configurations.

use crate::{config::ServerConfig, error::ServerError, server::EngineServer};

/// Creates a new engine server with default configuration.
///
/// The default engine is `./stockfish` and TLS is off, so this cannot fail
/// on TLS material; the `Result` mirrors [`create_server_with_config`].
pub fn create_server() -> Result<EngineServer, ServerError> {
    EngineServer::new(ServerConfig::default())
}

/// Creates a new engine server with custom configuration.
///
/// # Example
///
/// ```rust,no_run
/// use engine_server::{create_server_with_config, ServerConfig};
///
/// let config = ServerConfig {
///     bind_address: "0.0.0.0:9000".parse().unwrap(),
///     ..Default::default()
/// };
///
/// let server = create_server_with_config(config).expect("valid configuration");
/// ```
pub fn create_server_with_config(config: ServerConfig) -> Result<EngineServer, ServerError> {
    EngineServer::new(config)
}
