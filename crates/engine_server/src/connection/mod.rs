//! Connection management for client connections.
//!
//! This module handles the lifecycle of client connections, including
//! connection tracking, per-connection sessions, subscriber fan-out and
//! the exclusive engine lock.

pub mod client;
pub mod manager;

pub use client::ClientConnection;
pub use manager::ConnectionManager;

/// Type alias for connection identifiers.
///
/// Connection IDs are used to uniquely identify client connections
/// throughout their lifecycle on the server.
pub type ConnectionId = usize;
