//! Per-line command handling.
//!
//! [`MessageHandler::handle`] is the protocol state machine: it parses one
//! inbound line, checks the session against the auth policy and either
//! answers it or forwards it to the active engine.

use super::types::{ClientCommand, Reply};
use crate::auth::{AuthManager, AuthOutcome};
use crate::connection::{ConnectionId, ConnectionManager};
use crate::engine::EngineManager;
use crate::intelligence::IntelligenceBridge;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared state needed to answer client commands.
#[derive(Clone)]
pub struct MessageHandler {
    auth: Arc<AuthManager>,
    connections: Arc<ConnectionManager>,
    engines: Arc<EngineManager>,
    intelligence: Option<Arc<IntelligenceBridge>>,
    enforce_engine_lock: bool,
}

impl MessageHandler {
    pub fn new(
        auth: Arc<AuthManager>,
        connections: Arc<ConnectionManager>,
        engines: Arc<EngineManager>,
        intelligence: Option<Arc<IntelligenceBridge>>,
        enforce_engine_lock: bool,
    ) -> Self {
        Self {
            auth,
            connections,
            engines,
            intelligence,
            enforce_engine_lock,
        }
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Handles one inbound line from `connection_id`.
    ///
    /// # Returns
    ///
    /// The reply to send back, or `None` for empty lines and forwarded
    /// engine commands.
    pub async fn handle(&self, connection_id: ConnectionId, line: &str) -> Option<Reply> {
        let command = ClientCommand::parse(line)?;
        debug!("Connection {} -> {:?}", connection_id, command);

        if let ClientCommand::Auth(key) = command {
            return Some(self.authenticate(connection_id, key).await);
        }

        let authorized = self
            .connections
            .with_session(connection_id, |session| {
                self.auth.is_authorized(session, command.class())
            })
            .await?;
        if !authorized {
            debug!("Connection {} not authorized for {:?}", connection_id, command);
            return Some(Reply::AuthErr);
        }

        match command {
            ClientCommand::WhoAreYou => Some(Reply::Identity),
            ClientCommand::WhatEngine => Some(Reply::EngineName(self.engines.engine_name().await)),
            ClientCommand::Subscribe => {
                let subscribed = self
                    .connections
                    .with_session(connection_id, |session| session.subscribe())
                    .await?;
                Some(if subscribed { Reply::SubOk } else { Reply::SubErr })
            }
            ClientCommand::Unsubscribe => {
                let unsubscribed = self
                    .connections
                    .with_session(connection_id, |session| session.unsubscribe())
                    .await?;
                Some(if unsubscribed { Reply::UnsubOk } else { Reply::UnsubErr })
            }
            ClientCommand::Lock => {
                if self.connections.try_acquire_engine_lock(connection_id).await {
                    Some(Reply::LockOk)
                } else {
                    Some(Reply::LockErr)
                }
            }
            ClientCommand::Unlock => {
                if self.connections.release_engine_lock(connection_id).await {
                    Some(Reply::UnlockOk)
                } else {
                    Some(Reply::UnlockErr)
                }
            }
            ClientCommand::Engine(text) => self.forward(connection_id, text).await,
            ClientCommand::Auth(_) => None,
        }
    }

    async fn authenticate(&self, connection_id: ConnectionId, key: Option<&str>) -> Reply {
        // A bare `auth` is an error but not a failed attempt.
        let Some(key) = key else {
            return Reply::AuthErr;
        };

        let outcome = self
            .connections
            .with_session(connection_id, |session| self.auth.attempt(session, key))
            .await;

        match outcome {
            Some(AuthOutcome::Granted) => {
                info!("🔓 Connection {} authenticated", connection_id);
                Reply::AuthOk
            }
            Some(AuthOutcome::Blocked) => {
                warn!("🚫 Connection {} is blocked from authenticating", connection_id);
                Reply::AuthErr
            }
            Some(AuthOutcome::Rejected { .. }) | None => Reply::AuthErr,
        }
    }

    async fn forward(&self, connection_id: ConnectionId, text: &str) -> Option<Reply> {
        if self.enforce_engine_lock && !self.connections.may_command_engine(connection_id).await {
            debug!("Connection {} blocked by engine lock", connection_id);
            return Some(Reply::LockErr);
        }

        match self.engines.send_command(text).await {
            Ok(()) => {
                if let Some(intelligence) = &self.intelligence {
                    intelligence.observe_command(text).await;
                }
            }
            Err(e) => warn!("Dropped command from connection {}: {}", connection_id, e),
        }
        None
    }
}
