//! # Sistema de Jobs
//!
//! Registry asíncrono de trabajos diferidos: cada submit devuelve un ticket
//! al instante y el trabajo corre en su propio thread.
//!
//! ## Endpoints
//!
//! - `POST /hash` (form `password=...`) - Encolar job, devuelve el ticket
//! - `GET /hash/{ticket}` - Consultar resultado
//! - `GET /stats` - Total de jobs y duración promedio

pub mod barrier;
pub mod handlers;
pub mod hasher;
pub mod job;
pub mod registry;
pub mod stats;
pub mod ticket;

pub use barrier::CompletionBarrier;
pub use hasher::PasswordHasher;
pub use job::{JobRecord, JobStatus};
pub use registry::JobRegistry;
pub use stats::{StatsAggregator, StatsSnapshot};
pub use ticket::{Ticket, TicketAllocator};
