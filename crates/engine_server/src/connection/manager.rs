//! Connection manager for tracking and managing client connections.
//!
//! This module provides the central management system for all client
//! connections: ID assignment, session access, subscriber broadcasting and
//! the engine lock. The lock holder lives next to the connection map under
//! the same `RwLock`, so acquiring, releasing and auto-releasing on
//! disconnect can never observe each other half-way.

use super::{client::ClientConnection, ConnectionId};
use crate::auth::UserSession;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Everything guarded by the manager's lock.
#[derive(Debug, Default)]
struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ClientConnection>,
    lock_holder: Option<ConnectionId>,
}

/// Central manager for all client connections.
///
/// # Architecture
///
/// * Uses a single `RwLock` for connection storage and the lock holder
/// * Implements atomic connection ID generation
/// * Delivers to each client through its bounded outbound queue
#[derive(Debug)]
pub struct ConnectionManager {
    state: RwLock<ConnectionRegistry>,

    /// Atomic counter for generating unique connection IDs
    next_id: AtomicUsize,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    /// Creates a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ConnectionRegistry::default()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Adds a new connection and returns its unique ID.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - The network address of the connecting client
    /// * `outbound` - Sender half of the connection's write queue
    /// * `pre_authenticated` - Whether the session starts authenticated
    ///
    /// # Returns
    ///
    /// A unique `ConnectionId` assigned to this connection.
    pub async fn add_connection(
        &self,
        remote_addr: SocketAddr,
        outbound: mpsc::Sender<Message>,
        pre_authenticated: bool,
    ) -> ConnectionId {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let connection = ClientConnection::new(remote_addr, outbound, pre_authenticated);
        let mut state = self.state.write().await;
        state.connections.insert(connection_id, connection);
        info!("🔗 Connection {} from {}", connection_id, remote_addr);
        connection_id
    }

    /// Removes a connection, releasing the engine lock if it held it.
    pub async fn remove_connection(&self, connection_id: ConnectionId) {
        let mut state = self.state.write().await;
        if let Some(connection) = state.connections.remove(&connection_id) {
            if state.lock_holder == Some(connection_id) {
                state.lock_holder = None;
                info!("🔓 Engine lock released by disconnect of {}", connection_id);
            }
            info!(
                "❌ Connection {} from {} disconnected",
                connection_id, connection.remote_addr
            );
        }
    }

    /// Gets the total number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    /// Number of connections currently subscribed to engine output.
    pub async fn subscriber_count(&self) -> usize {
        self.state
            .read()
            .await
            .connections
            .values()
            .filter(|c| c.session.is_subscribed())
            .count()
    }

    /// Connection currently holding the engine lock.
    pub async fn lock_holder(&self) -> Option<ConnectionId> {
        self.state.read().await.lock_holder
    }

    /// Runs `f` against the session of `connection_id`.
    ///
    /// Returns `None` if the connection is gone.
    pub async fn with_session<R>(
        &self,
        connection_id: ConnectionId,
        f: impl FnOnce(&mut UserSession) -> R,
    ) -> Option<R> {
        let mut state = self.state.write().await;
        state
            .connections
            .get_mut(&connection_id)
            .map(|c| f(&mut c.session))
    }

    /// Queues `line` for every subscribed connection.
    ///
    /// A connection whose queue is full or closed is skipped; delivery to
    /// the others continues.
    ///
    /// # Returns
    ///
    /// The number of connections the line was queued for.
    pub async fn broadcast_to_subscribers(&self, line: &str) -> usize {
        let state = self.state.read().await;
        let mut delivered = 0;
        for (id, connection) in state.connections.iter() {
            if !connection.session.is_subscribed() {
                continue;
            }
            if connection.try_send_text(line) {
                delivered += 1;
            } else {
                warn!("⚠️ Dropped engine output for connection {}", id);
            }
        }
        debug!("Broadcast engine output to {} subscribers", delivered);
        delivered
    }

    /// Takes the engine lock for `connection_id` if nobody holds it.
    pub async fn try_acquire_engine_lock(&self, connection_id: ConnectionId) -> bool {
        let mut state = self.state.write().await;
        if state.lock_holder.is_some() {
            return false;
        }
        let Some(connection) = state.connections.get_mut(&connection_id) else {
            return false;
        };
        connection.session.set_lock(true);
        state.lock_holder = Some(connection_id);
        info!("🔒 Engine lock acquired by {}", connection_id);
        true
    }

    /// Releases the engine lock if `connection_id` holds it.
    pub async fn release_engine_lock(&self, connection_id: ConnectionId) -> bool {
        let mut state = self.state.write().await;
        if state.lock_holder != Some(connection_id) {
            return false;
        }
        state.lock_holder = None;
        if let Some(connection) = state.connections.get_mut(&connection_id) {
            connection.session.set_lock(false);
        }
        info!("🔓 Engine lock released by {}", connection_id);
        true
    }

    /// Whether `connection_id` may send engine commands under the lock.
    ///
    /// True when the lock is free or held by this connection.
    pub async fn may_command_engine(&self, connection_id: ConnectionId) -> bool {
        match self.state.read().await.lock_holder {
            None => true,
            Some(holder) => holder == connection_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn connect(manager: &ConnectionManager) -> (ConnectionId, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(8);
        (manager.add_connection(addr(), tx, false).await, rx)
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_start_at_one() {
        let manager = ConnectionManager::new();
        let (a, _ra) = connect(&manager).await;
        let (b, _rb) = connect(&manager).await;
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(manager.connection_count().await, 2);
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let manager = ConnectionManager::new();
        let (a, _ra) = connect(&manager).await;
        let (b, _rb) = connect(&manager).await;

        assert!(manager.try_acquire_engine_lock(a).await);
        assert!(!manager.try_acquire_engine_lock(b).await);
        assert!(!manager.try_acquire_engine_lock(a).await);
        assert!(!manager.release_engine_lock(b).await);
        assert!(!manager.may_command_engine(b).await);
        assert!(manager.may_command_engine(a).await);

        assert!(manager.release_engine_lock(a).await);
        assert!(!manager.release_engine_lock(a).await);
        assert!(manager.try_acquire_engine_lock(b).await);
        assert_eq!(manager.lock_holder().await, Some(b));
    }

    #[tokio::test]
    async fn test_disconnect_releases_lock() {
        let manager = ConnectionManager::new();
        let (a, _ra) = connect(&manager).await;
        let (b, _rb) = connect(&manager).await;

        assert!(manager.try_acquire_engine_lock(a).await);
        manager.remove_connection(a).await;
        assert_eq!(manager.lock_holder().await, None);
        assert!(manager.try_acquire_engine_lock(b).await);
    }

    #[tokio::test]
    async fn test_broadcast_only_reaches_subscribers() {
        let manager = ConnectionManager::new();
        let (a, mut ra) = connect(&manager).await;
        let (_b, mut rb) = connect(&manager).await;

        manager.with_session(a, |s| s.subscribe()).await;
        assert_eq!(manager.subscriber_count().await, 1);
        assert_eq!(manager.broadcast_to_subscribers("info depth 1").await, 1);

        match ra.try_recv() {
            Ok(Message::Text(text)) => assert_eq!(text.as_str(), "info depth 1"),
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(rb.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_queues() {
        let manager = ConnectionManager::new();
        let (a, ra) = connect(&manager).await;
        let (b, mut rb) = connect(&manager).await;
        manager.with_session(a, |s| s.subscribe()).await;
        manager.with_session(b, |s| s.subscribe()).await;
        drop(ra);

        assert_eq!(manager.broadcast_to_subscribers("bestmove e2e4").await, 1);
        assert!(rb.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_session_access_for_missing_connection() {
        let manager = ConnectionManager::new();
        assert!(manager.with_session(42, |s| s.subscribe()).await.is_none());
    }
}
