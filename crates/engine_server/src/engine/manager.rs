//! Registry of engine configurations with a single active engine.
//!
//! All engines started by the manager write into one output queue whose
//! receiver is handed out once, through [`EngineManager::take_output`], so
//! switching engines never rewires whoever consumes the output.
//!
//! The active slot is an async mutex held for the whole of a switch. A
//! command sent during a switch therefore waits and then reaches the new
//! engine, or fails with [`EngineError::NoActiveEngine`] if the switch
//! failed. Between stopping the old engine and the new one answering
//! `readyok`, output from neither is guaranteed: lines the old engine was
//! still printing may be lost.

use super::family::EngineFamily;
use super::process::{EngineProcess, OUTPUT_QUEUE_CAPACITY, UNKNOWN_ENGINE_NAME};
use crate::config::EngineConfig;
use crate::error::EngineError;
use dashmap::DashMap;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

#[derive(Debug)]
struct ActiveEngine {
    family: EngineFamily,
    process: EngineProcess,
}

/// Owns the engine registry and the active engine process.
#[derive(Debug)]
pub struct EngineManager {
    registry: DashMap<EngineFamily, EngineConfig>,
    active: Mutex<Option<ActiveEngine>>,
    output: mpsc::Sender<String>,
    output_receiver: Mutex<Option<mpsc::Receiver<String>>>,
}

impl EngineManager {
    /// Creates an empty manager with no active engine.
    pub fn new() -> Self {
        let (output, receiver) = mpsc::channel(OUTPUT_QUEUE_CAPACITY);
        Self {
            registry: DashMap::new(),
            active: Mutex::new(None),
            output,
            output_receiver: Mutex::new(Some(receiver)),
        }
    }

    /// Hands out the receiver for all engine output. Only the first call
    /// gets it; later calls return `None`.
    pub async fn take_output(&self) -> Option<mpsc::Receiver<String>> {
        self.output_receiver.lock().await.take()
    }

    /// Registers the configuration used to start `family`.
    pub fn register(&self, family: EngineFamily, config: EngineConfig) -> Result<(), EngineError> {
        if self.registry.contains_key(&family) {
            return Err(EngineError::AlreadyRegistered(family));
        }
        info!("📋 Registered {} engine at {}", family, config.path.display());
        self.registry.insert(family, config);
        Ok(())
    }

    /// Registered families, sorted.
    pub fn list(&self) -> Vec<EngineFamily> {
        let mut families: Vec<EngineFamily> = self.registry.iter().map(|entry| *entry.key()).collect();
        families.sort();
        families
    }

    /// Makes `family` the active engine.
    ///
    /// Stops the current engine first (failures are logged), then starts and
    /// initializes the new one. On failure no engine is active.
    pub async fn set_active(&self, family: EngineFamily) -> Result<(), EngineError> {
        let config = self
            .registry
            .get(&family)
            .map(|entry| entry.value().clone())
            .ok_or(EngineError::NotRegistered(family))?;

        let mut active = self.active.lock().await;

        if let Some(previous) = active.take() {
            info!("🔄 Switching engine from {} to {}", previous.family, family);
            if let Err(e) = previous.process.stop().await {
                warn!("Failed to stop {} engine cleanly: {}", previous.family, e);
            }
        }

        let process = EngineProcess::start(&config.path, self.output.clone()).map_err(|e| {
            error!("❌ Failed to start {} engine: {}", family, e);
            e
        })?;

        let commands = family.init_commands(&config).await;
        let handshake_timeout = Duration::from_millis(config.handshake_timeout_ms);
        if let Err(e) = process.initialize(&commands, handshake_timeout).await {
            error!("❌ Failed to initialize {} engine: {}", family, e);
            if let Err(stop_error) = process.stop().await {
                warn!("Failed to stop {} engine: {}", family, stop_error);
            }
            return Err(e);
        }

        *active = Some(ActiveEngine { family, process });
        info!("✅ Active engine: {}", family);
        Ok(())
    }

    pub async fn active_family(&self) -> Option<EngineFamily> {
        self.active.lock().await.as_ref().map(|a| a.family)
    }

    /// Name the active engine announced, or `Unknown`.
    pub async fn engine_name(&self) -> String {
        self.active
            .lock()
            .await
            .as_ref()
            .and_then(|a| a.process.name().map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_ENGINE_NAME.to_string())
    }

    pub async fn is_ready(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|a| a.process.is_ready())
    }

    /// Queues a command for the active engine without waiting for room.
    pub async fn send_command(&self, command: &str) -> Result<(), EngineError> {
        let active = self.active.lock().await;
        match active.as_ref() {
            Some(engine) => engine.process.send_command(command),
            None => Err(EngineError::NoActiveEngine),
        }
    }

    /// Stops the active engine, if any.
    pub async fn stop_all(&self) {
        let mut active = self.active.lock().await;
        if let Some(engine) = active.take() {
            if let Err(e) = engine.process.stop().await {
                warn!("Failed to stop {} engine: {}", engine.family, e);
            }
        }
    }
}

impl Default for EngineManager {
    fn default() -> Self {
        Self::new()
    }
}
