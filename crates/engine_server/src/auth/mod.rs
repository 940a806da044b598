//! Passkey authentication.
//!
//! A single passkey, fixed for the lifetime of the server, gates two classes
//! of commands. Read-class commands (engine name, subscriptions) are open by
//! default; write-class commands (locking and anything forwarded to the
//! engine) require authentication by default. Loopback clients can be
//! trusted outright.

pub mod session;

pub use session::UserSession;

use crate::config::AuthConfig;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use std::net::{IpAddr, SocketAddr};
use tracing::{info, warn};

/// Length of a generated passkey.
pub const PASS_KEY_LENGTH: usize = 10;

/// Authorization class of a client command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// Always allowed (identification, authentication itself)
    Open,
    /// Allowed when read auth is off or the session is authenticated
    Read,
    /// Allowed when write auth is off or the session is authenticated
    Write,
}

/// Result of an `auth` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted,
    Rejected { attempts: u32 },
    /// The session already used up its attempts
    Blocked,
}

/// Generates a passkey from the operating system's CSPRNG.
pub fn generate_pass_key() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(PASS_KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Whether `addr` is a loopback address, including IPv4-mapped IPv6.
pub fn is_localhost(addr: &SocketAddr) -> bool {
    match addr.ip() {
        IpAddr::V4(ip) => ip.is_loopback(),
        IpAddr::V6(ip) => {
            ip.is_loopback() || ip.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
        }
    }
}

/// Holds the passkey and the auth policy.
#[derive(Debug)]
pub struct AuthManager {
    pass_key: String,
    auth_write: bool,
    auth_read: bool,
    localhost_bypass: bool,
    max_failed_attempts: u32,
}

impl AuthManager {
    /// Creates the manager, generating a passkey if the configuration has none.
    pub fn new(config: &AuthConfig) -> Self {
        let pass_key = match config.pass_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => generate_pass_key(),
        };

        Self {
            pass_key,
            auth_write: config.auth_write,
            auth_read: config.auth_read,
            localhost_bypass: config.localhost_bypass,
            max_failed_attempts: config.max_failed_attempts,
        }
    }

    pub fn pass_key(&self) -> &str {
        &self.pass_key
    }

    pub fn requires_auth_for_write(&self) -> bool {
        self.auth_write
    }

    pub fn requires_auth_for_read(&self) -> bool {
        self.auth_read
    }

    pub fn max_failed_attempts(&self) -> u32 {
        self.max_failed_attempts
    }

    /// Plain comparison against the passkey.
    pub fn validate(&self, candidate: &str) -> bool {
        candidate == self.pass_key
    }

    /// Whether a connection from `addr` starts out authenticated.
    pub fn should_bypass(&self, addr: &SocketAddr) -> bool {
        self.localhost_bypass && is_localhost(addr)
    }

    /// Whether `session` may run a command of the given class.
    pub fn is_authorized(&self, session: &UserSession, class: CommandClass) -> bool {
        let required = match class {
            CommandClass::Open => false,
            CommandClass::Read => self.auth_read,
            CommandClass::Write => self.auth_write,
        };
        !required || session.is_authenticated()
    }

    /// Processes an `auth <key>` attempt against `session`.
    ///
    /// Only a wrong key counts as a failure; once the session is blocked the
    /// counter stops moving.
    pub fn attempt(&self, session: &mut UserSession, key: &str) -> AuthOutcome {
        if session.is_blocked(self.max_failed_attempts) {
            return AuthOutcome::Blocked;
        }

        if self.validate(key) {
            session.authenticate();
            return AuthOutcome::Granted;
        }

        let attempts = session.record_failed_attempt();
        warn!(
            "🔒 Failed authentication attempt ({}/{})",
            attempts, self.max_failed_attempts
        );
        AuthOutcome::Rejected { attempts }
    }

    /// Logs the passkey and policy once at startup.
    pub fn log_startup(&self) {
        info!("🔑 Passkey: {}", self.pass_key);
        info!(
            "🔐 Auth policy - write: {} | read: {} | localhost bypass: {}",
            self.auth_write, self.auth_read, self.localhost_bypass
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AuthManager {
        AuthManager::new(&AuthConfig {
            pass_key: Some("secret".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_generated_pass_key_format() {
        let key = generate_pass_key();
        assert_eq!(key.len(), PASS_KEY_LENGTH);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));

        let generated = AuthManager::new(&AuthConfig::default());
        assert_eq!(generated.pass_key().len(), PASS_KEY_LENGTH);

        let blank = AuthManager::new(&AuthConfig {
            pass_key: Some("   ".to_string()),
            ..Default::default()
        });
        assert_eq!(blank.pass_key().len(), PASS_KEY_LENGTH);
    }

    #[test]
    fn test_localhost_detection() {
        assert!(is_localhost(&"127.0.0.1:5000".parse().unwrap()));
        assert!(is_localhost(&"[::1]:5000".parse().unwrap()));
        assert!(is_localhost(&"[::ffff:127.0.0.1]:5000".parse().unwrap()));
        assert!(!is_localhost(&"192.168.1.20:5000".parse().unwrap()));
    }

    #[test]
    fn test_bypass_requires_flag() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        assert!(manager().should_bypass(&addr));

        let strict = AuthManager::new(&AuthConfig {
            localhost_bypass: false,
            ..Default::default()
        });
        assert!(!strict.should_bypass(&addr));
    }

    #[test]
    fn test_command_classes() {
        let auth = manager();
        let anonymous = UserSession::new(false);
        assert!(auth.is_authorized(&anonymous, CommandClass::Open));
        assert!(auth.is_authorized(&anonymous, CommandClass::Read));
        assert!(!auth.is_authorized(&anonymous, CommandClass::Write));

        let trusted = UserSession::new(true);
        assert!(auth.is_authorized(&trusted, CommandClass::Write));
    }

    #[test]
    fn test_lockout_after_three_failures() {
        let auth = manager();
        let mut session = UserSession::new(false);

        for attempt in 1..=3 {
            assert_eq!(
                auth.attempt(&mut session, "wrong"),
                AuthOutcome::Rejected { attempts: attempt }
            );
        }

        assert_eq!(auth.attempt(&mut session, "secret"), AuthOutcome::Blocked);
        assert!(!session.is_authenticated());
        assert_eq!(session.failed_attempts(), 3);
    }

    #[test]
    fn test_successful_attempt() {
        let auth = manager();
        let mut session = UserSession::new(false);
        assert!(matches!(auth.attempt(&mut session, "nope"), AuthOutcome::Rejected { .. }));
        assert_eq!(auth.attempt(&mut session, "secret"), AuthOutcome::Granted);
        assert!(session.is_authenticated());
    }
}
