//! # Registry de Jobs
//! src/jobs/registry.rs
//!
//! Coordina la vida de cada job: registrar `Pending` → ejecutar el trabajo
//! en su propio thread → publicar el resultado.
//!
//! ## Orden por job
//!
//! ```text
//! submit:  ticket = next()  →  barrier.enter()  →  jobs[ticket] = Pending  →  spawn
//! run:     work()  →  jobs[ticket] = Completed  →  stats.record()  →  barrier.leave()
//! ```
//!
//! Cuando la barrera llega a cero, todos los resultados ya son visibles
//! para `lookup()`.

use crate::error::RegistryError;
use crate::jobs::barrier::CompletionBarrier;
use crate::jobs::job::{JobRecord, JobStatus};
use crate::jobs::stats::{StatsAggregator, StatsSnapshot};
use crate::jobs::ticket::{Ticket, TicketAllocator};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info};

/// Registry central de jobs
///
/// Cada recurso compartido tiene su propia sincronización: leer stats no
/// bloquea un submit, y consultar un ticket no bloquea el contador.
#[derive(Debug, Default)]
pub struct JobRegistry {
    /// Emisor de tickets
    tickets: TicketAllocator,

    /// ticket -> estado del job
    jobs: Mutex<HashMap<Ticket, JobRecord>>,

    /// Estadísticas de jobs completados
    stats: StatsAggregator,

    /// Jobs aceptados que aún no terminaron
    barrier: CompletionBarrier,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encola un trabajo y devuelve su ticket inmediatamente.
    ///
    /// El registro `Pending` ya es visible cuando esta función retorna.
    pub fn submit<F>(self: &Arc<Self>, work: F) -> Result<Ticket, RegistryError>
    where
        F: FnOnce() -> String + Send + 'static,
    {
        let ticket = self.tickets.next();

        self.barrier.enter();
        {
            let mut jobs = self.jobs.lock().unwrap();
            jobs.insert(ticket, JobRecord::Pending);
        }

        let registry = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("job-{}", ticket))
            .spawn(move || registry.run(ticket, work));

        match spawned {
            Ok(_) => {
                debug!(%ticket, "job dispatched");
                Ok(ticket)
            }
            Err(source) => {
                error!(%ticket, error = %source, "failed to spawn job thread");
                self.publish(ticket, JobRecord::Failed(format!("dispatch failed: {}", source)));
                self.barrier.leave();
                Err(RegistryError::Dispatch { ticket, source })
            }
        }
    }

    /// Ejecuta el trabajo de un ticket (dentro del thread del job)
    fn run<F>(&self, ticket: Ticket, work: F)
    where
        F: FnOnce() -> String,
    {
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(work));
        let elapsed = start.elapsed();

        match outcome {
            Ok(result) => {
                self.publish(ticket, JobRecord::Completed(result));
                self.stats.record(elapsed);
                info!(%ticket, elapsed_ms = elapsed.as_millis() as u64, "job completed");
            }
            Err(payload) => {
                let reason = panic_reason(payload.as_ref());
                error!(%ticket, %reason, "job panicked");
                self.publish(ticket, JobRecord::Failed(reason));
            }
        }

        // Siempre al final: el resultado ya está publicado
        self.barrier.leave();
    }

    /// Reemplaza `Pending` por un estado terminal. Un estado terminal no se
    /// vuelve a escribir.
    fn publish(&self, ticket: Ticket, record: JobRecord) {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get(&ticket) {
            Some(existing) if existing.is_terminal() => {
                debug_assert!(false, "job {} already terminal: {:?}", ticket, existing);
            }
            Some(_) => {
                jobs.insert(ticket, record);
            }
            None => {
                debug_assert!(false, "job {} published without pending record", ticket);
            }
        }
    }

    /// Consulta el estado de un ticket. No bloquea esperando el resultado.
    pub fn lookup(&self, ticket: Ticket) -> JobStatus {
        let jobs = self.jobs.lock().unwrap();
        JobStatus::from(jobs.get(&ticket))
    }

    /// Bloquea hasta que no quede ningún job en vuelo, incluyendo los que se
    /// encolen mientras se espera.
    pub fn await_all_complete(&self) {
        let outstanding = self.barrier.outstanding();
        if outstanding > 0 {
            info!(outstanding, "waiting for in-flight jobs to complete");
        }
        self.barrier.wait();
    }

    /// (total, promedio en ms) de los jobs completados
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Jobs aceptados que aún no terminaron
    pub fn outstanding(&self) -> usize {
        self.barrier.outstanding()
    }

    /// Tickets emitidos hasta ahora
    pub fn issued(&self) -> u64 {
        self.tickets.issued()
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("job panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("job panicked: {}", msg)
    } else {
        "job panicked".to_string()
    }
}
