//! # Servidor TCP con Apagado Seguro
//! src/server/tcp.rs
//!
//! Servidor TCP concurrente: un thread para el accept loop y un thread por
//! conexión. El accept loop revisa el estado del listener entre cada
//! `accept()`; al pasar a `Draining` deja de aceptar y cierra el socket,
//! sin cortar las conexiones que ya están en vuelo.
//!
//! ## Política de admisión
//!
//! Una conexión solo se atiende si el estado es `Listening` tanto al
//! aceptarla como después de leer su request. Si no, se cierra sin
//! respuesta.

use crate::config::Config;
use crate::error::ServerError;
use crate::http::{read_request, Request, Response, StatusCode};
use crate::router::Router;
use crate::server::lifecycle::{Lifecycle, LifecycleState, StopRequest};
use crate::server::state::AppState;
use std::io::{self, ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Handle compartible para consultar y detener el servidor
#[derive(Debug, Clone, Default)]
pub struct ServerHandle {
    lifecycle: Arc<Lifecycle>,
    connections: Arc<AtomicUsize>,
}

impl ServerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn is_listening(&self) -> bool {
        self.lifecycle.is_listening()
    }

    /// Deja de aceptar conexiones nuevas. Idempotente.
    pub fn request_stop(&self) -> StopRequest {
        let outcome = self.lifecycle.request_stop();
        match outcome {
            StopRequest::Initiated => info!("stop requested, draining listener"),
            StopRequest::AlreadyRequested => debug!("stop already requested"),
            StopRequest::NotListening => debug!("stop requested before start"),
        }
        outcome
    }

    /// Conexiones que se están atendiendo ahora mismo
    pub fn active_connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Espera (sondeando cada `poll`) a que no quede ninguna conexión en vuelo.
    ///
    /// Devuelve `false` si pasó `limit` y todavía quedan conexiones.
    pub fn wait_idle(&self, poll: Duration, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        loop {
            let active = self.active_connections();
            if active == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                warn!(active, "connections still in flight");
                return false;
            }
            thread::sleep(poll);
        }
    }

    /// Pasa a `Listening` sin socket, para tests de handlers
    #[cfg(test)]
    pub(crate) fn mark_listening(&self) {
        let _ = self.lifecycle.advance(LifecycleState::NotStarted);
    }
}

/// Mantiene el contador de conexiones activas (también si el thread hace panic)
struct ActiveConnection(Arc<AtomicUsize>);

impl ActiveConnection {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        ActiveConnection(Arc::clone(counter))
    }
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Parámetros que necesita cada conexión
#[derive(Debug, Clone, Copy)]
struct ConnectionSettings {
    read_timeout: Duration,
    max_request_bytes: usize,
}

/// Servidor HTTP/1.0 que puede detenerse sin perder requests en vuelo
pub struct StoppableServer {
    config: Config,
    handle: ServerHandle,
    local_addr: Option<SocketAddr>,
    serve_thread: Option<JoinHandle<Result<(), ServerError>>>,
}

impl StoppableServer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            handle: ServerHandle::new(),
            local_addr: None,
            serve_thread: None,
        }
    }

    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> LifecycleState {
        self.handle.state()
    }

    pub fn request_stop(&self) -> StopRequest {
        self.handle.request_stop()
    }

    /// Dirección real del listener (útil con puerto 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Hace bind, pasa a `Listening` y lanza el accept loop.
    ///
    /// Un error de bind es fatal y se devuelve al llamador.
    pub fn start(&mut self, router: Arc<Router>, state: Arc<AppState>) -> Result<SocketAddr, ServerError> {
        if self.handle.state() != LifecycleState::NotStarted {
            return Err(ServerError::AlreadyStarted);
        }

        let address = self.config.address();
        info!("starting server on {}", address);

        let bind_error = |source: io::Error| ServerError::Bind {
            addr: address.clone(),
            source,
        };
        let listener = TcpListener::bind(&address).map_err(bind_error)?;
        listener.set_nonblocking(true).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        self.handle
            .lifecycle
            .advance(LifecycleState::NotStarted)
            .map_err(|_| ServerError::AlreadyStarted)?;

        let handle = self.handle.clone();
        let poll = self.config.accept_poll();
        let settings = ConnectionSettings {
            read_timeout: self.config.read_timeout(),
            max_request_bytes: self.config.max_request_bytes,
        };

        let spawned = thread::Builder::new()
            .name("accept-loop".to_string())
            .spawn(move || Self::serve(listener, router, state, handle, poll, settings));

        match spawned {
            Ok(join) => {
                self.serve_thread = Some(join);
                self.local_addr = Some(local_addr);
                info!("server listening on {}", local_addr);
                Ok(local_addr)
            }
            Err(e) => {
                // Sin accept loop no hay nada que drenar
                self.handle.lifecycle.request_stop();
                let _ = self.handle.lifecycle.advance(LifecycleState::Draining);
                Err(ServerError::Spawn(e))
            }
        }
    }

    /// Bloquea hasta que el accept loop termina y pasa a `Stopped`.
    ///
    /// No espera a las conexiones en vuelo ni a los jobs.
    pub fn wait_for_stop(&mut self) -> Result<(), ServerError> {
        let result = match self.serve_thread.take() {
            Some(join) => match join.join() {
                Ok(result) => result,
                Err(payload) => panic::resume_unwind(payload),
            },
            None => Ok(()),
        };

        if self.handle.lifecycle.advance(LifecycleState::Draining).is_ok() {
            info!(
                active_connections = self.handle.active_connections(),
                "server stopped"
            );
        }

        result
    }

    /// Accept loop. Termina cuando el estado deja de ser `Listening`.
    fn serve(
        listener: TcpListener,
        router: Arc<Router>,
        state: Arc<AppState>,
        handle: ServerHandle,
        poll: Duration,
        settings: ConnectionSettings,
    ) -> Result<(), ServerError> {
        let result = loop {
            if !handle.is_listening() {
                break Ok(());
            }

            match listener.accept() {
                Ok((stream, peer)) => {
                    if !handle.is_listening() {
                        debug!(%peer, "rejecting connection: server is not listening");
                        drop(stream);
                        continue;
                    }
                    Self::spawn_connection(stream, peer, &router, &state, &handle, settings);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(poll),
                Err(e) if is_transient(&e) => {
                    warn!(error = %e, "transient accept error");
                }
                Err(e) => {
                    // Un error después de pedir el stop es esperado
                    match handle.lifecycle.request_stop() {
                        StopRequest::Initiated => {
                            error!(error = %e, "accept loop failed");
                            break Err(ServerError::Accept(e));
                        }
                        _ => break Ok(()),
                    }
                }
            }
        };

        drop(listener);
        info!("accept loop finished");
        result
    }

    fn spawn_connection(
        stream: TcpStream,
        peer: SocketAddr,
        router: &Arc<Router>,
        state: &Arc<AppState>,
        handle: &ServerHandle,
        settings: ConnectionSettings,
    ) {
        debug!(%peer, "new connection");

        let guard = ActiveConnection::enter(&handle.connections);
        let router = Arc::clone(router);
        let state = Arc::clone(state);
        let handle = handle.clone();

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                let _guard = guard;
                if let Err(e) = Self::handle_connection(stream, &router, &state, &handle, settings) {
                    warn!(%peer, error = %e, "connection error");
                }
            });

        if let Err(e) = spawned {
            // El closure (y con él el stream y el guard) ya se liberó
            error!(%peer, error = %e, "failed to spawn connection thread");
        }
    }

    fn handle_connection(
        mut stream: TcpStream,
        router: &Router,
        state: &AppState,
        handle: &ServerHandle,
        settings: ConnectionSettings,
    ) -> io::Result<()> {
        let start = Instant::now();

        // En algunas plataformas el stream hereda el modo no bloqueante
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(settings.read_timeout))?;

        let response = match read_request(&mut stream, settings.max_request_bytes) {
            Ok(Some(raw)) => {
                if !handle.is_listening() {
                    debug!("closing active connection: server is not listening");
                    return Ok(());
                }
                match Request::parse(&raw) {
                    Ok(request) => {
                        debug!("{} {}", request.method().as_str(), request.path());
                        router.route(&request, state)
                    }
                    Err(e) => Response::text(StatusCode::BadRequest, &format!("Invalid request: {}", e)),
                }
            }
            Ok(None) => return Ok(()),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                Response::text(StatusCode::BadRequest, &format!("Invalid request: {}", e))
            }
            Err(e) => return Err(e),
        };

        stream.write_all(&response.to_bytes())?;
        stream.flush()?;

        debug!(
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "response sent"
        );
        Ok(())
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::Interrupted
    )
}
