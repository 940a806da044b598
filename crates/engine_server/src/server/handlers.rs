//! Connection handling logic for WebSocket clients.
//!
//! This module contains the logic that manages the lifecycle of individual
//! client connections: WebSocket handshaking, line processing and cleanup.

use crate::{error::ServerError, messaging::MessageHandler};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    accept_async_with_config,
    tungstenite::{protocol::WebSocketConfig, Message},
};
use tracing::{debug, error, trace};

/// Messages that can wait for one client's writer before replies and
/// engine output start being dropped.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Handles a single client connection from establishment to cleanup.
///
/// # Connection Flow
///
/// 1. Perform the WebSocket handshake
/// 2. Register the connection and its session
/// 3. Run the incoming and outgoing tasks
/// 4. Remove the connection, releasing the engine lock if it held it
///
/// # Arguments
///
/// * `stream` - Plain TCP or TLS stream for the client connection
/// * `addr` - The remote address of the client
/// * `handler` - Protocol handler shared by all connections
/// * `pre_authenticated` - Whether the session starts authenticated
/// * `ws_config` - WebSocket limits
///
/// # Message Handling
///
/// * **Incoming Task**: Reads frames, answers commands through the handler
/// * **Outgoing Task**: Drains the connection's queue into the socket
///
/// Replies and broadcast engine output share the outbound queue, so a
/// client sees them in the order they were produced.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    handler: MessageHandler,
    pre_authenticated: bool,
    ws_config: WebSocketConfig,
) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let ws_stream = accept_async_with_config(stream, Some(ws_config))
        .await
        .map_err(|e| ServerError::Network(format!("WebSocket handshake failed: {e}")))?;

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (outbound, mut outbound_receiver) = mpsc::channel::<Message>(OUTBOUND_QUEUE_CAPACITY);

    let connections = handler.connections().clone();
    let connection_id = connections
        .add_connection(addr, outbound.clone(), pre_authenticated)
        .await;
    if pre_authenticated {
        debug!("Connection {} pre-authenticated as localhost", connection_id);
    }

    let incoming_task = async {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("📨 {} <- {}", connection_id, text.as_str());
                    if let Some(reply) = handler.handle(connection_id, text.as_str()).await {
                        if outbound.send(Message::Text(reply.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("🔌 Client {} requested close", connection_id);
                    break;
                }
                Err(e) => {
                    error!("WebSocket error for connection {}: {}", connection_id, e);
                    break;
                }
                // tungstenite queues the Pong for a Ping on its own
                _ => {}
            }
        }
    };

    let outgoing_task = async {
        while let Some(message) = outbound_receiver.recv().await {
            if let Err(e) = ws_sender.send(message).await {
                error!("Failed to send message to connection {}: {}", connection_id, e);
                break;
            }
        }
    };

    // Run both tasks concurrently until one completes
    tokio::select! {
        _ = incoming_task => {},
        _ = outgoing_task => {},
    }

    connections.remove_connection(connection_id).await;
    let _ = ws_sender.close().await;
    Ok(())
}
