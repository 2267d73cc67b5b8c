//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Listener con ciclo de vida `NotStarted → Listening → Draining → Stopped`:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones (un thread por conexión)
//! 3. Al pedir el stop deja de aceptar, sin cortar lo que está en vuelo
//! 4. `wait_for_stop()` espera a que el accept loop termine

pub mod control;
pub mod lifecycle;
pub mod state;
pub mod tcp;

pub use lifecycle::{LifecycleState, StopRequest};
pub use state::AppState;
pub use tcp::{ServerHandle, StoppableServer};
