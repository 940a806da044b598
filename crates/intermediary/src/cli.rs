//! Command-line interface handling for the intermediary.
//!
//! This module provides command-line argument parsing using the `clap` crate.
//! Every flag is optional: a flag that is not given leaves the configuration
//! file's value (or the built-in default) in place.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use engine_server::EngineFamily;
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// This structure holds all the command-line options that can be used to
/// override configuration file settings or provide runtime parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    /// Path to the configuration file; defaults are used when absent
    pub config_path: Option<PathBuf>,
    /// Optional override for the listen address
    pub bind_address: Option<String>,
    pub tls: Option<bool>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    /// Optional override for the engine binary
    pub engine_path: Option<PathBuf>,
    pub family: Option<EngineFamily>,
    pub auth_write: Option<bool>,
    pub auth_read: Option<bool>,
    pub localhost_bypass: Option<bool>,
    pub enforce_engine_lock: Option<bool>,
    pub multipv: Option<u32>,
    pub threads: Option<u32>,
    pub hash: Option<u32>,
    pub intelligence: Option<bool>,
    /// Raw UCI commands sent after the engine's option list
    pub uci_args: Option<Vec<String>>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Shorthand for `--log-level debug`
    pub debug: bool,
}

/// A boolean flag that may be given bare (`--tls`) or with a value
/// (`--tls=false`, `--tls false`).
fn switch(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("BOOL")
        .help(help)
        .num_args(0..=1)
        .default_missing_value("true")
        .value_parser(value_parser!(bool))
}

/// Builds the clap command describing every flag.
pub fn command() -> Command {
    Command::new("Chesshook Intermediary")
        .version(env!("CARGO_PKG_VERSION"))
        .about("WebSocket intermediary between chess clients and a UCI engine")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path (JSON, or TOML with a .toml extension)"),
        )
        .arg(
            Arg::new("addr")
                .short('a')
                .long("addr")
                .value_name("ADDRESS")
                .help("Listen address (e.g., 127.0.0.1:8080)"),
        )
        .arg(switch("tls", "Serve wss:// instead of ws://"))
        .arg(
            Arg::new("cert")
                .long("cert")
                .value_name("FILE")
                .help("PEM certificate chain for TLS"),
        )
        .arg(
            Arg::new("key")
                .long("key")
                .value_name("FILE")
                .help("PEM PKCS#8 private key for TLS"),
        )
        .arg(
            Arg::new("engine")
                .short('e')
                .long("engine")
                .value_name("PATH")
                .help("Path to the engine binary"),
        )
        .arg(
            Arg::new("family")
                .short('f')
                .long("family")
                .value_name("FAMILY")
                .help("Engine family (generic, stockfish, leela, maia, rodent)")
                .value_parser(|s: &str| s.parse::<EngineFamily>().map_err(|e| e.to_string())),
        )
        .arg(switch("authwrite", "Require authentication for write operations"))
        .arg(switch("authread", "Require authentication for read operations"))
        .arg(switch("localhost", "Treat localhost connections as authenticated"))
        .arg(switch(
            "enforce-lock",
            "Reject engine commands from everyone but the lock holder",
        ))
        .arg(
            Arg::new("multipv")
                .long("multipv")
                .value_name("N")
                .help("Multi-PV count for analysis")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_name("N")
                .help("Number of engine threads")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("hash")
                .long("hash")
                .value_name("MB")
                .help("Hash table size in MB")
                .value_parser(value_parser!(u32)),
        )
        .arg(switch("intelligence", "Re-rank the engine's candidate moves"))
        .arg(
            Arg::new("uciargs")
                .long("uciargs")
                .value_name("COMMANDS")
                .help("Extra UCI commands, semicolon-separated"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
}

impl CliArgs {
    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    /// Parses an explicit argument list.
    ///
    /// # Arguments
    ///
    /// * `args` - The arguments, starting with the program name
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let path = |name: &str| matches.get_one::<String>(name).map(PathBuf::from);
        let flag = |name: &str| matches.get_one::<bool>(name).copied();
        let number = |name: &str| matches.get_one::<u32>(name).copied();

        Self {
            config_path: path("config"),
            bind_address: matches.get_one::<String>("addr").cloned(),
            tls: flag("tls"),
            cert_file: path("cert"),
            key_file: path("key"),
            engine_path: path("engine"),
            family: matches.get_one::<EngineFamily>("family").copied(),
            auth_write: flag("authwrite"),
            auth_read: flag("authread"),
            localhost_bypass: flag("localhost"),
            enforce_engine_lock: flag("enforce-lock"),
            multipv: number("multipv"),
            threads: number("threads"),
            hash: number("hash"),
            intelligence: flag("intelligence"),
            uci_args: matches.get_one::<String>("uciargs").map(|s| split_uci_args(s)),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            debug: matches.get_flag("debug"),
        }
    }

    /// The log level the flags ask for, if any. `--debug` wins over
    /// `--log-level`.
    pub fn effective_log_level(&self) -> Option<String> {
        if self.debug {
            Some("debug".to_string())
        } else {
            self.log_level.clone()
        }
    }
}

/// Splits a semicolon-separated command list, dropping empty entries.
pub fn split_uci_args(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|command| !command.is_empty())
        .map(str::to_string)
        .collect()
}
