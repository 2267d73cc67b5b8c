//! # Handlers HTTP para Jobs
//! src/jobs/handlers.rs
//!
//! Implementa los endpoints del sistema de jobs:
//! - `POST /hash` - encola el hash de un password
//! - `GET /hash/{ticket}` - resultado del job
//! - `GET /stats` - estadísticas de jobs completados

use crate::error::{RegistryError, TicketParseError};
use crate::http::{Method, Request, Response, StatusCode};
use crate::jobs::job::JobStatus;
use crate::jobs::ticket::Ticket;
use crate::server::state::AppState;
use tracing::{debug, error, warn};

/// Handler para /hash y /hash/{ticket}
///
/// `POST /hash` con `password=...` (form o query) encola el job y responde
/// el ticket en texto plano. `GET /hash/{ticket}` consulta el resultado.
pub fn hash_handler(req: &Request, state: &AppState) -> Response {
    let segments = req.path_segments();

    match req.method() {
        Method::POST if segments.len() == 1 => submit_hash(req, state),
        Method::POST => Response::text(
            StatusCode::MethodNotAllowed,
            &format!("Request not supported: {}", req.path()),
        )
        .with_header("Allow", "GET, HEAD"),
        Method::GET | Method::HEAD => lookup_hash(segments.get(1).copied(), state),
    }
}

fn submit_hash(req: &Request, state: &AppState) -> Response {
    // Sin password se hashea el string vacío
    let password = req.form_param("password").unwrap_or_default();
    let hasher = state.hasher;

    match state.registry.submit(move || hasher.hash(&password)) {
        Ok(ticket) => Response::text(StatusCode::Ok, &ticket.to_string()),
        Err(RegistryError::Dispatch { ticket, source }) => {
            error!(%ticket, error = %source, "failed to dispatch hash job");
            Response::text(
                StatusCode::ServiceUnavailable,
                &format!("Unable to start hashing job number [{}]: {}", ticket, source),
            )
        }
    }
}

fn lookup_hash(raw_ticket: Option<&str>, state: &AppState) -> Response {
    let ticket = match raw_ticket.unwrap_or("").parse::<Ticket>() {
        Ok(ticket) => ticket,
        Err(TicketParseError::Missing) => {
            return Response::text(
                StatusCode::BadRequest,
                "Unable to get encoded password because the Job number is missing from the request.",
            );
        }
        Err(TicketParseError::Malformed(raw)) => {
            return Response::text(
                StatusCode::BadRequest,
                &format!(
                    "Unable to get encoded password because the Job number from the request is not a valid number: {}",
                    raw
                ),
            );
        }
    };

    let status = state.registry.lookup(ticket);
    debug!(%ticket, status = status.as_str(), "job lookup");

    match status {
        JobStatus::Completed(digest) => Response::text(StatusCode::Ok, &digest),
        JobStatus::Pending => Response::text(
            StatusCode::Accepted,
            &format!(
                "The password for job number [{}] is still hashing try again later.",
                ticket
            ),
        ),
        JobStatus::NotFound => Response::text(
            StatusCode::NotFound,
            &format!("The job number {{{}}} doesn't exist.", ticket),
        ),
        JobStatus::Failed(reason) => {
            warn!(%ticket, %reason, "lookup of failed job");
            Response::text(
                StatusCode::InternalServerError,
                &format!("The job number [{}] failed: {}", ticket, reason),
            )
        }
    }
}

/// Handler para /stats
///
/// # Ejemplo de response
/// ```json
/// {"total":6,"average":5001}
/// ```
pub fn stats_handler(_req: &Request, state: &AppState) -> Response {
    match serde_json::to_string(&state.registry.stats()) {
        Ok(body) => Response::json(&body),
        Err(e) => {
            error!(error = %e, "failed to serialize stats");
            Response::text(StatusCode::InternalServerError, "Unable to serialize stats")
        }
    }
}
