//! # Errores del Servidor
//! src/error.rs
//!
//! Errores tipados del servidor. Los resultados "esperados" (ticket
//! desconocido, job pendiente, stop redundante) NO son errores: se modelan
//! como valores de retorno en sus módulos respectivos.

use std::io;

use crate::jobs::Ticket;

/// Errores del ciclo de vida del listener y de configuración
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No se pudo adquirir la dirección (fatal al arrancar)
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// `start()` llamado sobre un servidor que ya arrancó
    #[error("server was already started")]
    AlreadyStarted,

    /// No se pudo crear el thread del accept loop
    #[error("could not spawn accept loop: {0}")]
    Spawn(#[source] io::Error),

    /// Error inesperado del accept loop mientras se escuchaba
    #[error("accept loop failed: {0}")]
    Accept(#[source] io::Error),

    /// Configuración inválida
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errores al despachar un job
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// El sistema operativo no pudo crear el thread del job.
    /// El ticket queda consumido y el registro marcado como fallido.
    #[error("could not dispatch job {ticket}: {source}")]
    Dispatch {
        ticket: Ticket,
        #[source]
        source: io::Error,
    },
}

/// Error de parsing de un ticket en la frontera HTTP
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketParseError {
    #[error("missing job number")]
    Missing,

    #[error("not a valid job number: {0}")]
    Malformed(String),
}

