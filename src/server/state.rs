//! # Estado Compartido de los Handlers
//! src/server/state.rs
//!
//! Todo lo que un handler necesita, pasado explícitamente (sin globales).

use crate::app::StopSignal;
use crate::jobs::{JobRegistry, PasswordHasher};
use crate::server::tcp::ServerHandle;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::warn;

pub struct AppState {
    /// Registry de jobs
    pub registry: Arc<JobRegistry>,

    /// Trabajo que ejecuta cada job
    pub hasher: PasswordHasher,

    /// Estado del listener
    pub server: ServerHandle,

    /// Canal del orquestador para avisar que se pidió el stop
    stop_tx: Sender<StopSignal>,
}

impl AppState {
    pub fn new(
        registry: Arc<JobRegistry>,
        hasher: PasswordHasher,
        server: ServerHandle,
        stop_tx: Sender<StopSignal>,
    ) -> Self {
        Self {
            registry,
            hasher,
            server,
            stop_tx,
        }
    }

    /// Avisa al orquestador. Si ya no escucha, no hay nada que hacer.
    pub fn notify_stop(&self, signal: StopSignal) {
        if self.stop_tx.send(signal).is_err() {
            warn!(?signal, "stop signal dropped: orchestrator is gone");
        }
    }
}
