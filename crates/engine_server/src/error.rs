//! Error types and handling for the engine server.
//!
//! This module defines the error types that can occur during server operations,
//! providing clear categorization of different failure modes.

use crate::engine::EngineFamily;
use std::time::Duration;

/// Enumeration of possible server errors.
///
/// Categorizes errors into network, TLS, engine and internal failures
/// to help with debugging and error handling.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or connection issues
    #[error("Network error: {0}")]
    Network(String),

    /// Missing or unusable certificate material
    #[error("TLS error: {0}")]
    Tls(String),

    /// Failures starting or talking to the engine process
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by engine processes and the engine manager.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine binary could not be started
    #[error("Failed to spawn engine '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The spawned process did not expose one of its standard streams
    #[error("Engine process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `readyok` did not arrive in time after `isready`
    #[error("Engine did not answer readyok within {0:?}")]
    HandshakeTimeout(Duration),

    /// The bounded input queue is full; the command was dropped
    #[error("Engine input queue is full")]
    InputQueueFull,

    /// The engine's I/O tasks have stopped
    #[error("Engine is not running")]
    NotRunning,

    #[error("Engine family '{0}' is already registered")]
    AlreadyRegistered(EngineFamily),

    #[error("Engine family '{0}' is not registered")]
    NotRegistered(EngineFamily),

    #[error("No active engine")]
    NoActiveEngine,

    #[error("Unknown engine family: {0}")]
    UnknownFamily(String),
}
