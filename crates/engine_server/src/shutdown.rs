//! Shutdown coordination for graceful server shutdown.
//!
//! This module provides shared shutdown state so the accept loop, the
//! output bridge and the application lifecycle agree on when to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Shared shutdown state for coordinating graceful shutdown across components.
#[derive(Debug, Clone)]
pub struct ShutdownState {
    /// Set once shutdown begins; no new connections are accepted afterwards
    shutdown_initiated: Arc<watch::Sender<bool>>,
    /// Set once the engines are stopped and the process may exit
    shutdown_complete: Arc<AtomicBool>,
}

impl ShutdownState {
    /// Creates a new shutdown state with both flags set to false.
    pub fn new() -> Self {
        let (shutdown_initiated, _) = watch::channel(false);
        Self {
            shutdown_initiated: Arc::new(shutdown_initiated),
            shutdown_complete: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true if shutdown has been initiated.
    pub fn is_shutdown_initiated(&self) -> bool {
        *self.shutdown_initiated.borrow()
    }

    /// Returns true if shutdown is complete and the process may exit.
    pub fn is_shutdown_complete(&self) -> bool {
        self.shutdown_complete.load(Ordering::Acquire)
    }

    /// Initiates shutdown and wakes everything waiting in [`Self::wait`].
    pub fn initiate_shutdown(&self) {
        let already = self.shutdown_initiated.send_replace(true);
        if !already {
            info!("🛑 Shutdown initiated - no new connections will be accepted");
        }
    }

    /// Marks shutdown as complete.
    pub fn complete_shutdown(&self) {
        self.shutdown_complete.store(true, Ordering::Release);
        info!("✅ Engines stopped - ready for exit");
    }

    /// Resolves once shutdown has been initiated.
    pub async fn wait(&self) {
        let mut receiver = self.shutdown_initiated.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = receiver.wait_for(|initiated| *initiated).await;
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_resolves_after_initiation() {
        let state = ShutdownState::new();
        assert!(!state.is_shutdown_initiated());

        let waiter = {
            let state = state.clone();
            tokio::spawn(async move { state.wait().await })
        };
        state.initiate_shutdown();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter woke up")
            .unwrap();
        assert!(state.is_shutdown_initiated());
        assert!(!state.is_shutdown_complete());

        state.complete_shutdown();
        assert!(state.is_shutdown_complete());
    }

    #[tokio::test]
    async fn test_wait_after_initiation_returns_immediately() {
        let state = ShutdownState::new();
        state.initiate_shutdown();
        tokio::time::timeout(Duration::from_millis(100), state.wait())
            .await
            .expect("already initiated");
    }
}
