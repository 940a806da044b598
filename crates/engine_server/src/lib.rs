//! # Engine Server
//!
//! Bridges many network clients to a single UCI chess engine over a
//! line-oriented WebSocket protocol.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **Auth Manager** - Passkey, auth policy and lockout
//! * **Connection Manager** - Sessions, subscriber fan-out and the engine lock
//! * **Message Handler** - The per-line protocol state machine
//! * **Engine Manager** - The active engine process and its option lists
//! * **Intelligence Bridge** - Optional re-ranking of the engine's candidates
//!
//! ### Message Flow
//!
//! 1. A client sends one command per text frame
//! 2. The handler checks the session against the auth policy
//! 3. Protocol commands are answered directly
//! 4. Anything else is forwarded to the engine's input queue
//! 5. Engine output is broadcast, unchanged and in order, to every
//!    subscribed connection
//!
//! ### Protocol
//!
//! | Command | Reply |
//! |---|---|
//! | `whoareyou` | `iam chesshook-intermediaryv1` |
//! | `whatengine` | `engine <name>` |
//! | `auth <key>` | `authok` / `autherr` |
//! | `sub` / `unsub` | `subok` / `suberr`, `unsubok` / `unsuberr` |
//! | `lock` / `unlock` | `lockok` / `lockerr`, `unlockok` / `unlockerr` |
//! | anything else | forwarded, no reply |
//!
//! ## Error Handling
//!
//! The server uses structured error types ([`ServerError`], [`EngineError`]):
//!
//! * **Network errors** - Binding and handshake failures
//! * **TLS errors** - Missing or invalid certificate material
//! * **Engine errors** - Spawn, handshake and queue failures
//!
//! Protocol failures are never errors: they are reply tokens.
//!
//! ## Thread Safety
//!
//! * Connections and the lock holder share one `RwLock`
//! * The active engine sits behind an async `Mutex`
//! * Engine I/O runs on dedicated tasks over bounded queues

// Re-export core types and functions for easy access
pub use config::{AuthConfig, EngineConfig, ServerConfig, TlsConfig};
pub use engine::EngineFamily;
pub use error::{EngineError, ServerError};
pub use server::EngineServer;
pub use shutdown::ShutdownState;
pub use utils::{create_server, create_server_with_config};

// Public module declarations
pub mod auth;
pub mod config;
pub mod connection;
pub mod engine;
pub mod error;
pub mod intelligence;
pub mod messaging;
pub mod server;
pub mod shutdown;
pub mod utils;

#[cfg(all(test, unix))]
mod test_support;

#[cfg(test)]
mod tests;
