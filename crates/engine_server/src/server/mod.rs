//! Core server implementation and connection handling.
//!
//! This module contains the main engine server structure, the per-connection
//! handling logic, the engine output bridge and TLS setup.

pub mod bridge;
pub mod core;
pub mod handlers;
pub mod tls;

pub use core::EngineServer;
