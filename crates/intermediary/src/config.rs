//! Configuration management for the intermediary.
//!
//! This module handles loading, merging and validation of the configuration
//! file, and its conversion into the [`ServerConfig`] the server consumes.
//! Files are JSON unless their extension is `.toml`.

use crate::cli::CliArgs;
use engine_server::{AuthConfig, EngineConfig, EngineFamily, ServerConfig, TlsConfig};
use move_intelligence::IntelligenceSettings;
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors raised while loading or validating the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML configuration: {0}")]
    TomlRead(#[from] toml::de::Error),

    #[error("Could not serialize TOML configuration: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("{0}")]
    Validation(String),
}

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from the file extension.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Logging configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to use JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Application configuration loaded from the configuration file.
///
/// Empty strings stand for "not set" wherever a path or key is optional, so
/// hand-written files can leave a field blank instead of removing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listen address, `host:port`
    pub address: String,
    pub tls: bool,
    pub cert_file: String,
    pub key_file: String,

    pub auth_write: bool,
    pub auth_read: bool,
    pub localhost_bypass: bool,
    /// Generated at startup when empty
    pub pass_key: String,
    pub enforce_engine_lock: bool,

    pub engine_path: String,
    pub family: EngineFamily,
    /// Raw commands sent after the family's option list
    pub uci_args: Vec<String>,
    pub multipv: u32,
    pub threads: u32,
    /// Hash table size in MB
    pub hash: u32,
    pub handshake_timeout_ms: u64,

    pub weights_file: String,
    pub weights_dir: String,
    pub backend: String,
    pub maia_rating: u32,
    pub personality_file: String,
    pub personalities_dir: String,
    pub tablesbase_dir: String,

    pub intelligence_enabled: bool,
    pub intelligence_settings: IntelligenceSettings,

    pub logging: LoggingSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        let auth = AuthConfig::default();

        Self {
            address: "127.0.0.1:8080".to_string(),
            tls: false,
            cert_file: String::new(),
            key_file: String::new(),
            auth_write: auth.auth_write,
            auth_read: auth.auth_read,
            localhost_bypass: auth.localhost_bypass,
            pass_key: String::new(),
            enforce_engine_lock: true,
            engine_path: engine.path.to_string_lossy().into_owned(),
            family: engine.family,
            uci_args: Vec::new(),
            multipv: engine.multipv,
            threads: engine.threads,
            hash: engine.hash_mb,
            handshake_timeout_ms: engine.handshake_timeout_ms,
            weights_file: String::new(),
            weights_dir: engine.weights_dir.to_string_lossy().into_owned(),
            backend: engine.backend,
            maia_rating: engine.maia_rating,
            personality_file: String::new(),
            personalities_dir: engine.personalities_dir.to_string_lossy().into_owned(),
            tablesbase_dir: String::new(),
            intelligence_enabled: false,
            intelligence_settings: IntelligenceSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

fn path_string(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

impl AppConfig {
    /// Loads configuration from a JSON or TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the
    /// specified path and returns the default configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The loaded or default configuration, or an error if loading/creation failed.
    pub async fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if path.exists() {
            let content = tokio::fs::read_to_string(path).await.map_err(io_error)?;
            Self::from_str_with_format(&content, ConfigFormat::for_path(path))
        } else {
            let default_config = AppConfig::default();
            let content = default_config.to_string_with_format(ConfigFormat::for_path(path))?;
            tokio::fs::write(path, content).await.map_err(io_error)?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Parses configuration text; missing fields take their defaults.
    pub fn from_str_with_format(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        Ok(match format {
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        })
    }

    pub fn to_string_with_format(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        Ok(match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        })
    }

    /// Applies command-line overrides. Flags always win over file values.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(address) = &args.bind_address {
            self.address = address.clone();
        }
        if let Some(tls) = args.tls {
            self.tls = tls;
        }
        if let Some(cert) = &args.cert_file {
            self.cert_file = path_string(cert.clone());
        }
        if let Some(key) = &args.key_file {
            self.key_file = path_string(key.clone());
        }
        if let Some(engine) = &args.engine_path {
            self.engine_path = path_string(engine.clone());
        }
        if let Some(family) = args.family {
            self.family = family;
        }
        if let Some(auth_write) = args.auth_write {
            self.auth_write = auth_write;
        }
        if let Some(auth_read) = args.auth_read {
            self.auth_read = auth_read;
        }
        if let Some(bypass) = args.localhost_bypass {
            self.localhost_bypass = bypass;
        }
        if let Some(enforce) = args.enforce_engine_lock {
            self.enforce_engine_lock = enforce;
        }
        if let Some(multipv) = args.multipv {
            self.multipv = multipv;
        }
        if let Some(threads) = args.threads {
            self.threads = threads;
        }
        if let Some(hash) = args.hash {
            self.hash = hash;
        }
        if let Some(intelligence) = args.intelligence {
            self.intelligence_enabled = intelligence;
        }
        if let Some(uci_args) = &args.uci_args {
            self.uci_args = uci_args.clone();
        }
        if let Some(level) = args.effective_log_level() {
            self.logging.level = level;
        }
        if args.json_logs {
            self.logging.json_format = true;
        }
    }

    /// Resolves the listen address. Host names such as `localhost` are
    /// looked up and the first address wins.
    pub fn resolve_address(&self) -> Result<SocketAddr, ConfigError> {
        if let Ok(addr) = self.address.parse::<SocketAddr>() {
            return Ok(addr);
        }
        self.address
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConfigError::Validation(format!("Invalid listen address: {}", self.address)))
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error describing the issue.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolve_address()?;

        if self.tls && (self.cert_file.trim().is_empty() || self.key_file.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "TLS enabled but cert/key files not specified".to_string(),
            ));
        }

        if self.engine_path.trim().is_empty() {
            return Err(ConfigError::Validation("Engine path cannot be empty".to_string()));
        }

        if self.multipv == 0 {
            return Err(ConfigError::Validation("multipv must be at least 1".to_string()));
        }

        if self.threads == 0 {
            return Err(ConfigError::Validation("threads must be at least 1".to_string()));
        }

        if self.handshake_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "handshake_timeout_ms must be greater than 0".to_string(),
            ));
        }

        self.intelligence_settings
            .validate()
            .map_err(|e| ConfigError::Validation(format!("intelligence_settings: {e}")))?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            )));
        }

        Ok(())
    }

    /// Converts the application configuration into a server configuration.
    ///
    /// # Returns
    ///
    /// A `ServerConfig` ready for [`engine_server::create_server_with_config`].
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let pass_key = self.pass_key.trim();
        let mut intelligence = self.intelligence_settings.clone();
        intelligence.enabled = self.intelligence_enabled;

        Ok(ServerConfig {
            bind_address: self.resolve_address()?,
            auth: AuthConfig {
                pass_key: (!pass_key.is_empty()).then(|| pass_key.to_string()),
                auth_write: self.auth_write,
                auth_read: self.auth_read,
                localhost_bypass: self.localhost_bypass,
                ..AuthConfig::default()
            },
            tls: TlsConfig {
                enabled: self.tls,
                cert_path: non_empty_path(&self.cert_file),
                key_path: non_empty_path(&self.key_file),
            },
            engine: EngineConfig {
                family: self.family,
                path: PathBuf::from(self.engine_path.trim()),
                multipv: self.multipv,
                threads: self.threads,
                hash_mb: self.hash,
                init_commands: self.uci_args.clone(),
                weights_file: non_empty_path(&self.weights_file),
                weights_dir: PathBuf::from(&self.weights_dir),
                personality_file: non_empty_path(&self.personality_file),
                personalities_dir: PathBuf::from(&self.personalities_dir),
                tablebase_dir: non_empty_path(&self.tablesbase_dir),
                backend: self.backend.clone(),
                maia_rating: self.maia_rating,
                handshake_timeout_ms: self.handshake_timeout_ms,
            },
            intelligence,
            enforce_engine_lock: self.enforce_engine_lock,
            ..ServerConfig::default()
        })
    }
}
