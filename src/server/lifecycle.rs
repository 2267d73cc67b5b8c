//! # Ciclo de Vida del Listener
//! src/server/lifecycle.rs
//!
//! Máquina de estados estrictamente ordenada:
//!
//! ```text
//! NotStarted → Listening → Draining → Stopped
//! ```
//!
//! Sin transiciones hacia atrás y sin saltos. Cualquier thread puede leer el
//! estado; solo el servidor lo modifica.

use std::fmt;
use std::sync::RwLock;
use tracing::info;

/// Estado del listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    /// `start()` todavía no se llamó
    NotStarted,

    /// Aceptando conexiones
    Listening,

    /// Stop pedido: se rechazan conexiones nuevas, el trabajo en vuelo sigue
    Draining,

    /// El accept loop terminó
    Stopped,
}

impl LifecycleState {
    /// Único sucesor válido
    fn next(self) -> Option<Self> {
        match self {
            LifecycleState::NotStarted => Some(LifecycleState::Listening),
            LifecycleState::Listening => Some(LifecycleState::Draining),
            LifecycleState::Draining => Some(LifecycleState::Stopped),
            LifecycleState::Stopped => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::NotStarted => "not_started",
            LifecycleState::Listening => "listening",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resultado de `request_stop()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    /// Esta llamada fue la que inició el drenado
    Initiated,

    /// Ya se estaba drenando o ya se detuvo (no-op)
    AlreadyRequested,

    /// El servidor nunca arrancó (no-op)
    NotListening,
}

/// Transición rechazada: el estado actual no era el esperado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InvalidTransition {
    pub current: LifecycleState,
    pub requested: LifecycleState,
}

/// Dueño del estado. Solo el módulo `server` lo hace avanzar; afuera se ve a
/// través de `ServerHandle`.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: RwLock<LifecycleState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LifecycleState::NotStarted),
        }
    }

    /// Lectura no bloqueante (más allá del lock) del estado actual
    pub fn state(&self) -> LifecycleState {
        *self.state.read().unwrap()
    }

    pub fn is_listening(&self) -> bool {
        self.state() == LifecycleState::Listening
    }

    /// Avanza de `from` a su sucesor. Falla si el estado actual no es `from`.
    pub(super) fn advance(&self, from: LifecycleState) -> Result<LifecycleState, InvalidTransition> {
        let mut state = self.state.write().unwrap();
        let requested = from.next().unwrap_or(from);

        if *state != from || requested == from {
            return Err(InvalidTransition {
                current: *state,
                requested,
            });
        }

        *state = requested;
        info!(from = %from, to = %requested, "server state changed");
        Ok(requested)
    }

    /// Pide el stop. Solo la primera llamada en `Listening` tiene efecto.
    pub fn request_stop(&self) -> StopRequest {
        match self.advance(LifecycleState::Listening) {
            Ok(_) => StopRequest::Initiated,
            Err(InvalidTransition {
                current: LifecycleState::NotStarted,
                ..
            }) => StopRequest::NotListening,
            Err(_) => StopRequest::AlreadyRequested,
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_initial_state() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::NotStarted);
        assert!(!lifecycle.is_listening());
    }

    #[test]
    fn test_full_ordered_lifecycle() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.advance(LifecycleState::NotStarted), Ok(LifecycleState::Listening));
        assert!(lifecycle.is_listening());

        assert_eq!(lifecycle.request_stop(), StopRequest::Initiated);
        assert_eq!(lifecycle.state(), LifecycleState::Draining);

        assert_eq!(lifecycle.advance(LifecycleState::Draining), Ok(LifecycleState::Stopped));
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        let lifecycle = Lifecycle::new();
        // NotStarted → Draining no es alcanzable
        assert!(lifecycle.advance(LifecycleState::Listening).is_err());
        assert!(lifecycle.advance(LifecycleState::Draining).is_err());
        assert_eq!(lifecycle.state(), LifecycleState::NotStarted);

        lifecycle.advance(LifecycleState::NotStarted).unwrap();
        lifecycle.advance(LifecycleState::Listening).unwrap();
        lifecycle.advance(LifecycleState::Draining).unwrap();

        let err = lifecycle.advance(LifecycleState::Stopped).unwrap_err();
        assert_eq!(err.current, LifecycleState::Stopped);
        assert!(lifecycle.advance(LifecycleState::NotStarted).is_err());
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[test]
    fn test_request_stop_is_idempotent() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.request_stop(), StopRequest::NotListening);

        lifecycle.advance(LifecycleState::NotStarted).unwrap();
        assert_eq!(lifecycle.request_stop(), StopRequest::Initiated);
        assert_eq!(lifecycle.request_stop(), StopRequest::AlreadyRequested);
        assert_eq!(lifecycle.state(), LifecycleState::Draining);

        lifecycle.advance(LifecycleState::Draining).unwrap();
        assert_eq!(lifecycle.request_stop(), StopRequest::AlreadyRequested);
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[test]
    fn test_concurrent_stop_only_one_wins() {
        let lifecycle = Arc::new(Lifecycle::new());
        lifecycle.advance(LifecycleState::NotStarted).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lifecycle = Arc::clone(&lifecycle);
                thread::spawn(move || lifecycle.request_stop())
            })
            .collect();

        let initiated = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| *r == StopRequest::Initiated)
            .count();

        assert_eq!(initiated, 1);
        assert_eq!(lifecycle.state(), LifecycleState::Draining);
    }

    #[test]
    fn test_states_are_ordered() {
        assert!(LifecycleState::NotStarted < LifecycleState::Listening);
        assert!(LifecycleState::Listening < LifecycleState::Draining);
        assert!(LifecycleState::Draining < LifecycleState::Stopped);
        assert_eq!(LifecycleState::Draining.to_string(), "draining");
    }
}
