//! # Estado de un Job
//! src/jobs/job.rs
//!
//! Un job pasa por dos fases: `Pending` (aceptado, sin resultado) y una fase
//! terminal (`Completed` o `Failed`). La fase terminal nunca cambia.

/// Registro interno guardado en el mapa del registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRecord {
    /// Job aceptado, todavía procesándose
    Pending,

    /// Job terminado con su resultado
    Completed(String),

    /// Job que no pudo producir resultado (panic o thread no creado)
    Failed(String),
}

impl JobRecord {
    /// Verifica si el job está en estado terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobRecord::Pending)
    }
}

/// Resultado de consultar un ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Ticket nunca emitido por este registry
    NotFound,

    /// Encontrado, sin terminar
    Pending,

    /// Encontrado y terminado
    Completed(String),

    /// Encontrado y fallido
    Failed(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::NotFound => "not_found",
            JobStatus::Pending => "pending",
            JobStatus::Completed(_) => "completed",
            JobStatus::Failed(_) => "failed",
        }
    }
}

impl From<Option<&JobRecord>> for JobStatus {
    fn from(record: Option<&JobRecord>) -> Self {
        match record {
            None => JobStatus::NotFound,
            Some(JobRecord::Pending) => JobStatus::Pending,
            Some(JobRecord::Completed(result)) => JobStatus::Completed(result.clone()),
            Some(JobRecord::Failed(reason)) => JobStatus::Failed(reason.clone()),
        }
    }
}
