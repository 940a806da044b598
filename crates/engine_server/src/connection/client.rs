//! Client connection representation.
//!
//! This module defines the structure of individual client connections,
//! tracking their session state and the queue feeding their socket.

use crate::auth::UserSession;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Represents an individual client connection to the server.
///
/// # Fields
///
/// * `remote_addr` - The network address of the connected client
/// * `session` - Authentication, subscription and lock state
/// * `outbound` - Queue drained by the connection's writer task
#[derive(Debug)]
pub struct ClientConnection {
    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// Session state for this connection
    pub session: UserSession,

    /// Messages queued for delivery to this client
    pub outbound: mpsc::Sender<Message>,
}

impl ClientConnection {
    /// Creates a new client connection.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - The network address of the connecting client
    /// * `outbound` - Sender half of the connection's write queue
    /// * `pre_authenticated` - Whether the session starts authenticated
    ///
    /// # Returns
    ///
    /// A new `ClientConnection` instance ready for use.
    pub fn new(
        remote_addr: SocketAddr,
        outbound: mpsc::Sender<Message>,
        pre_authenticated: bool,
    ) -> Self {
        Self {
            remote_addr,
            session: UserSession::new(pre_authenticated),
            outbound,
        }
    }

    /// Queues a text line without waiting.
    ///
    /// Returns `false` when the queue is full or the writer has gone away.
    pub fn try_send_text(&self, line: &str) -> bool {
        self.outbound
            .try_send(Message::Text(line.to_string().into()))
            .is_ok()
    }
}
