//! Core engine server implementation.
//!
//! This module contains the main `EngineServer` struct, which owns the
//! listener, the auth policy, the connection registry, the engine manager
//! and the output bridge feeding engine output to subscribers.

use crate::{
    auth::AuthManager,
    config::ServerConfig,
    connection::ConnectionManager,
    engine::EngineManager,
    error::ServerError,
    intelligence::IntelligenceBridge,
    messaging::MessageHandler,
    server::{bridge::run_output_bridge, handlers::handle_connection, tls::load_acceptor},
    shutdown::ShutdownState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_native_tls::TlsAcceptor;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{error, info, warn};

/// The engine server.
///
/// # Architecture
///
/// * **Auth**: One passkey and policy shared by every connection
/// * **Connections**: Registry of sessions, subscribers and the engine lock
/// * **Engines**: The active UCI engine and its output queue
/// * **Bridge**: A task broadcasting engine output to subscribers
pub struct EngineServer {
    config: ServerConfig,
    auth: Arc<AuthManager>,
    connection_manager: Arc<ConnectionManager>,
    engine_manager: Arc<EngineManager>,
    intelligence: Option<Arc<IntelligenceBridge>>,
    tls_acceptor: Option<TlsAcceptor>,
}

impl EngineServer {
    /// Creates a new engine server with the specified configuration.
    ///
    /// The engine is registered but not started; call
    /// [`start_engine`](Self::start_engine) before serving clients.
    ///
    /// # Returns
    ///
    /// The server, or an error if TLS material cannot be loaded.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let auth = Arc::new(AuthManager::new(&config.auth));
        let connection_manager = Arc::new(ConnectionManager::new());

        let engine_manager = EngineManager::new();
        engine_manager.register(config.engine.family, config.engine.clone())?;

        let intelligence = config
            .intelligence
            .enabled
            .then(|| Arc::new(IntelligenceBridge::new(config.intelligence.clone())));

        let tls_acceptor = if config.tls.enabled {
            let (Some(cert), Some(key)) = (&config.tls.cert_path, &config.tls.key_path) else {
                return Err(ServerError::Tls(
                    "TLS enabled but certificate or key path missing".to_string(),
                ));
            };
            Some(load_acceptor(cert, key)?)
        } else {
            None
        };

        Ok(Self {
            config,
            auth,
            connection_manager,
            engine_manager: Arc::new(engine_manager),
            intelligence,
            tls_acceptor,
        })
    }

    /// Starts and initializes the configured engine.
    pub async fn start_engine(&self) -> Result<(), ServerError> {
        self.engine_manager
            .set_active(self.config.engine.family)
            .await?;
        Ok(())
    }

    /// Binds to the configured address and serves until shutdown is
    /// initiated through `shutdown_state`.
    pub async fn start_with_shutdown_state(&self, shutdown_state: ShutdownState) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_state).await
    }

    /// Binds the listener for the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| {
                ServerError::Network(format!("Failed to bind {}: {}", self.config.bind_address, e))
            })?;
        Ok(listener)
    }

    /// Serves clients on an already bound listener.
    ///
    /// Spawns the output bridge, then accepts connections until shutdown is
    /// initiated. Can only run once per server.
    pub async fn serve(&self, listener: TcpListener, shutdown_state: ShutdownState) -> Result<(), ServerError> {
        let engine_output = self
            .engine_manager
            .take_output()
            .await
            .ok_or_else(|| ServerError::Internal("Server is already running".to_string()))?;

        let bridge = tokio::spawn(run_output_bridge(
            engine_output,
            self.connection_manager.clone(),
            self.intelligence.clone(),
        ));

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(e.to_string()))?;
        let scheme = if self.tls_acceptor.is_some() { "wss" } else { "ws" };
        info!("🌐 Listening on {}://{}", scheme, local_addr);
        self.auth.log_startup();
        if self.intelligence.is_some() {
            info!("🧠 Move intelligence enabled");
        }

        loop {
            let (stream, addr) = tokio::select! {
                _ = shutdown_state.wait() => {
                    info!("🛑 Accept loop stopping - shutdown initiated");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                },
            };

            self.spawn_connection(stream, addr);
        }

        bridge.abort();
        info!("Server stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: tokio::net::TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
        }

        let handler = self.message_handler();
        let pre_authenticated = self.auth.should_bypass(&addr);
        let ws_config = self.websocket_config();
        let tls_acceptor = self.tls_acceptor.clone();

        tokio::spawn(async move {
            let result = match tls_acceptor {
                Some(acceptor) => match acceptor.accept(stream).await {
                    Ok(tls_stream) => {
                        handle_connection(tls_stream, addr, handler, pre_authenticated, ws_config).await
                    }
                    Err(e) => Err(ServerError::Tls(format!("TLS handshake with {} failed: {}", addr, e))),
                },
                None => handle_connection(stream, addr, handler, pre_authenticated, ws_config).await,
            };

            if let Err(e) = result {
                error!("Connection error: {:?}", e);
            }
        });
    }

    fn message_handler(&self) -> MessageHandler {
        MessageHandler::new(
            self.auth.clone(),
            self.connection_manager.clone(),
            self.engine_manager.clone(),
            self.intelligence.clone(),
            self.config.enforce_engine_lock,
        )
    }

    fn websocket_config(&self) -> WebSocketConfig {
        WebSocketConfig::default()
            .max_message_size(Some(self.config.max_message_size))
            .max_frame_size(Some(self.config.max_message_size))
    }

    /// Stops the active engine.
    pub async fn stop_engines(&self) {
        self.engine_manager.stop_all().await;
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The passkey clients authenticate with.
    pub fn pass_key(&self) -> &str {
        self.auth.pass_key()
    }

    pub fn connection_manager(&self) -> Arc<ConnectionManager> {
        self.connection_manager.clone()
    }

    pub fn engine_manager(&self) -> Arc<EngineManager> {
        self.engine_manager.clone()
    }
}
