//! Message handling for the line protocol.
//!
//! This module provides the parsing of inbound text lines into commands and
//! the handler that applies auth policy and either answers them or forwards
//! them to the engine.

pub mod handler;
pub mod types;

pub use handler::MessageHandler;
pub use types::{ClientCommand, Reply, IDENTITY};
