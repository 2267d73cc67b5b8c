//! # Barrera de Finalización
//! src/jobs/barrier.rs
//!
//! Contador de jobs pendientes + Condvar. `wait()` bloquea hasta que el
//! contador llega a cero, incluyendo jobs que entren mientras se espera.

use std::sync::{Condvar, Mutex};

#[derive(Debug, Default)]
pub struct CompletionBarrier {
    outstanding: Mutex<usize>,
    drained: Condvar,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un job más en vuelo
    pub fn enter(&self) {
        let mut outstanding = self.outstanding.lock().unwrap();
        *outstanding += 1;
    }

    /// Marca un job como terminado y despierta a los que esperan si era el último
    pub fn leave(&self) {
        let mut outstanding = self.outstanding.lock().unwrap();
        debug_assert!(*outstanding > 0, "leave() without matching enter()");
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.drained.notify_all();
        }
    }

    /// Bloquea hasta que no queden jobs en vuelo
    pub fn wait(&self) {
        let mut outstanding = self.outstanding.lock().unwrap();
        while *outstanding > 0 {
            outstanding = self.drained.wait(outstanding).unwrap();
        }
    }

    pub fn outstanding(&self) -> usize {
        *self.outstanding.lock().unwrap()
    }
}
