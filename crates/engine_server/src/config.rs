//! Server configuration types and defaults.
//!
//! This module contains the server configuration structure and default values
//! used to initialize and customize the engine server behavior.

use crate::engine::EngineFamily;
use move_intelligence::IntelligenceSettings;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Maximum size of a single inbound WebSocket message.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Failed `auth` attempts after which a session is locked out.
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 3;

/// Configuration structure for the engine server.
///
/// Contains all necessary parameters to configure server behavior including
/// network settings, authentication policy, TLS material and the engine to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Authentication policy
    pub auth: AuthConfig,

    /// Optional TLS termination
    pub tls: TlsConfig,

    /// Engine binary and its initialization options
    pub engine: EngineConfig,

    /// Move re-ranking applied to the engine's analysis
    pub intelligence: IntelligenceSettings,

    /// Maximum inbound message size in bytes
    pub max_message_size: usize,

    /// Reject forwarded engine commands from anyone but the lock holder
    /// while the engine lock is held
    pub enforce_engine_lock: bool,
}

/// Authentication policy for client connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Passkey clients must present; generated at startup when absent
    pub pass_key: Option<String>,

    /// Require authentication for lock/unlock and forwarded engine commands
    pub auth_write: bool,

    /// Require authentication for engine-name queries and subscriptions
    pub auth_read: bool,

    /// Treat loopback connections as already authenticated
    pub localhost_bypass: bool,

    /// Failed attempts before a session is permanently refused
    pub max_failed_attempts: u32,
}

/// TLS settings for the listener.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    pub enabled: bool,

    /// PEM certificate chain
    pub cert_path: Option<PathBuf>,

    /// PEM PKCS#8 private key
    pub key_path: Option<PathBuf>,
}

/// Engine binary and the options sent to it during the UCI handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Option set used during initialization
    pub family: EngineFamily,

    /// Path to the engine executable
    pub path: PathBuf,

    pub multipv: u32,
    pub threads: u32,

    /// Hash table size in MB
    pub hash_mb: u32,

    /// Raw commands sent after the family's own options
    pub init_commands: Vec<String>,

    /// Explicit network weights (Leela, Maia)
    pub weights_file: Option<PathBuf>,

    /// Directory searched for default network weights
    pub weights_dir: PathBuf,

    /// Personality file (Rodent)
    pub personality_file: Option<PathBuf>,

    /// Directory relative personality files are resolved against
    pub personalities_dir: PathBuf,

    /// Root of the endgame tablebases; Syzygy files live in `syzygy/`
    pub tablebase_dir: Option<PathBuf>,

    /// Neural network backend (Leela, Maia)
    pub backend: String,

    /// Target playing strength for Maia networks
    pub maia_rating: u32,

    /// How long to wait for `readyok` after `isready`, in milliseconds
    pub handshake_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pass_key: None,
            auth_write: true,
            auth_read: false,
            localhost_bypass: true,
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            family: EngineFamily::Generic,
            path: PathBuf::from("./stockfish"),
            multipv: 3,
            threads: 1,
            hash_mb: 128,
            init_commands: Vec::new(),
            weights_file: None,
            weights_dir: PathBuf::from("weights"),
            personality_file: None,
            personalities_dir: PathBuf::from("personalities"),
            tablebase_dir: None,
            backend: "multiplexing".to_string(),
            maia_rating: 1500,
            handshake_timeout_ms: 10_000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            auth: AuthConfig::default(),
            tls: TlsConfig::default(),
            engine: EngineConfig::default(),
            intelligence: IntelligenceSettings::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            enforce_engine_lock: true,
        }
    }
}
