//! # Estadísticas de Jobs
//! src/jobs/stats.rs
//!
//! Acumula el número de jobs completados y la duración total en
//! milisegundos. El promedio se calcula bajo demanda.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;

/// Totales internos (se actualizan juntos bajo el mismo lock)
#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    count: u64,
    total_ms: u64,
}

/// Snapshot serializable para /stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Número de jobs completados
    pub total: u64,

    /// Duración promedio en milisegundos
    pub average: u64,
}

/// Agregador de estadísticas thread-safe
#[derive(Debug, Default)]
pub struct StatsAggregator {
    totals: RwLock<Totals>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra la duración de un job completado
    pub fn record(&self, duration: Duration) {
        let ms = duration_to_millis(duration);
        let mut totals = self.totals.write().unwrap();
        totals.count += 1;
        totals.total_ms += ms;
    }

    /// Devuelve (total, promedio). El promedio es 0 si no hay jobs.
    pub fn snapshot(&self) -> StatsSnapshot {
        let totals = *self.totals.read().unwrap();
        StatsSnapshot {
            total: totals.count,
            average: rounded_average(totals.total_ms, totals.count),
        }
    }
}

/// Convierte a milisegundos redondeando la mitad hacia arriba
pub fn duration_to_millis(duration: Duration) -> u64 {
    let nanos = duration.as_nanos();
    ((nanos + 500_000) / 1_000_000) as u64
}

/// total / count redondeado (half away from zero); 0 si count == 0
fn rounded_average(total_ms: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    let total = total_ms as u128;
    let count = count as u128;
    ((2 * total + count) / (2 * count)) as u64
}
