//! # Handler de Apagado
//! src/server/control.rs
//!
//! `GET /close` inicia el drenado del servidor y avisa al orquestador.

use crate::app::StopSignal;
use crate::http::{Request, Response, StatusCode};
use crate::server::lifecycle::StopRequest;
use crate::server::state::AppState;

pub const CLOSE_SENT: &str = "Sent HTTP Server close request...";
pub const CLOSE_ALREADY_ISSUED: &str = "HTTP Server close request already issued...";

/// Handler para /close
///
/// Solo la primera llamada detiene el listener; las siguientes son no-ops.
pub fn close_handler(_req: &Request, state: &AppState) -> Response {
    match state.server.request_stop() {
        StopRequest::Initiated => {
            state.notify_stop(StopSignal::CloseRequest);
            Response::text(StatusCode::Ok, CLOSE_SENT)
        }
        StopRequest::AlreadyRequested | StopRequest::NotListening => {
            Response::text(StatusCode::Ok, CLOSE_ALREADY_ISSUED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobRegistry, PasswordHasher};
    use crate::server::lifecycle::LifecycleState;
    use crate::server::tcp::ServerHandle;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_close_is_idempotent() {
        let handle = ServerHandle::new();
        handle.mark_listening();

        let (tx, rx) = mpsc::channel();
        let state = AppState::new(
            Arc::new(JobRegistry::new()),
            PasswordHasher::new(Duration::ZERO),
            handle.clone(),
            tx,
        );
        let request = Request::parse(b"GET /close HTTP/1.0\r\n\r\n").unwrap();

        let first = close_handler(&request, &state);
        assert_eq!(first.body_text(), CLOSE_SENT);
        assert_eq!(handle.state(), LifecycleState::Draining);
        assert_eq!(rx.try_recv().unwrap(), StopSignal::CloseRequest);

        let second = close_handler(&request, &state);
        assert_eq!(second.body_text(), CLOSE_ALREADY_ISSUED);
        assert!(rx.try_recv().is_err());
    }
}
