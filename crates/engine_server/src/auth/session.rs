//! Per-connection authentication and subscription state.

/// State owned by a single client connection.
///
/// Created when the connection is accepted and dropped with it, so a client
/// that reconnects always starts over with a clean slate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSession {
    authenticated: bool,
    failed_attempts: u32,
    subscribed: bool,
    has_lock: bool,
}

impl UserSession {
    /// Creates a fresh session.
    ///
    /// # Arguments
    ///
    /// * `pre_authenticated` - Whether the connection is trusted from the start
    ///   (loopback connections with the localhost bypass enabled)
    pub fn new(pre_authenticated: bool) -> Self {
        Self {
            authenticated: pre_authenticated,
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn authenticate(&mut self) {
        self.authenticated = true;
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Counts one more wrong passkey and returns the new total.
    pub fn record_failed_attempt(&mut self) -> u32 {
        self.failed_attempts = self.failed_attempts.saturating_add(1);
        self.failed_attempts
    }

    /// A blocked session fails every further `auth`, correct passkey or not.
    pub fn is_blocked(&self, max_failed_attempts: u32) -> bool {
        self.failed_attempts >= max_failed_attempts
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Returns `false` if the session was already subscribed.
    pub fn subscribe(&mut self) -> bool {
        !std::mem::replace(&mut self.subscribed, true)
    }

    /// Returns `false` if the session was not subscribed.
    pub fn unsubscribe(&mut self) -> bool {
        std::mem::replace(&mut self.subscribed, false)
    }

    pub fn has_lock(&self) -> bool {
        self.has_lock
    }

    pub(crate) fn set_lock(&mut self, held: bool) {
        self.has_lock = held;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_toggles() {
        let mut session = UserSession::new(false);
        assert!(session.subscribe());
        assert!(!session.subscribe());
        assert!(session.is_subscribed());
        assert!(session.unsubscribe());
        assert!(!session.unsubscribe());
    }

    #[test]
    fn test_blocking_after_failures() {
        let mut session = UserSession::new(false);
        assert_eq!(session.record_failed_attempt(), 1);
        assert_eq!(session.record_failed_attempt(), 2);
        assert!(!session.is_blocked(3));
        assert_eq!(session.record_failed_attempt(), 3);
        assert!(session.is_blocked(3));
    }

    #[test]
    fn test_pre_authenticated_session() {
        assert!(UserSession::new(true).is_authenticated());
        assert!(!UserSession::new(false).is_authenticated());
    }
}
