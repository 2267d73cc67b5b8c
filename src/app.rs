//! # Orquestador del Proceso
//! src/app.rs
//!
//! Arma el registry y el servidor, espera una señal de stop y apaga en orden:
//!
//! ```text
//! request_stop() → wait_for_stop() → conexiones en cero → await_all_complete() → stats finales
//! ```
//!
//! Los jobs aceptados antes del stop siempre terminan antes de que `run()`
//! retorne.

use crate::config::Config;
use crate::error::ServerError;
use crate::jobs::{JobRegistry, PasswordHasher, StatsSnapshot};
use crate::router::Router;
use crate::server::{AppState, ServerHandle, StoppableServer};
use std::net::SocketAddr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Origen del pedido de apagado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// `GET /close`
    CloseRequest,

    /// Ctrl-C / SIGINT
    Interrupt,

    /// El listener dejó de escuchar sin que llegara una señal: un stop pedido
    /// vía `ServerHandle`, o un error del accept loop (que `shutdown()`
    /// devuelve)
    ListenerStopped,
}

/// Resumen del apagado
#[derive(Debug, Clone, Copy)]
pub struct ShutdownReport {
    /// Tiempo desde `App::new()`
    pub uptime: Duration,

    /// Stats después de drenar todos los jobs
    pub stats: StatsSnapshot,

    /// Qué disparó el apagado
    pub signal: StopSignal,
}

pub struct App {
    config: Config,
    registry: Arc<JobRegistry>,
    server: StoppableServer,
    stop_tx: Sender<StopSignal>,
    stop_rx: Receiver<StopSignal>,
    started_at: Instant,
}

impl App {
    /// Valida la configuración y arma los componentes (sin abrir el puerto)
    pub fn new(config: Config) -> Result<Self, ServerError> {
        config.validate()?;

        let (stop_tx, stop_rx) = mpsc::channel();
        Ok(Self {
            server: StoppableServer::new(config.clone()),
            registry: Arc::new(JobRegistry::new()),
            config,
            stop_tx,
            stop_rx,
            started_at: Instant::now(),
        })
    }

    /// Canal para pedir el apagado desde afuera (p. ej. el handler de Ctrl-C)
    pub fn stop_sender(&self) -> Sender<StopSignal> {
        self.stop_tx.clone()
    }

    pub fn handle(&self) -> ServerHandle {
        self.server.handle()
    }

    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr()
    }

    /// Abre el puerto y empieza a aceptar conexiones
    pub fn start(&mut self) -> Result<SocketAddr, ServerError> {
        let state = Arc::new(AppState::new(
            Arc::clone(&self.registry),
            PasswordHasher::new(self.config.hash_delay()),
            self.server.handle(),
            self.stop_tx.clone(),
        ));
        self.server.start(Arc::new(Router::with_routes()), state)
    }

    /// Bloquea hasta recibir una señal de stop.
    ///
    /// Si el accept loop muere sin que nadie pida el stop, también retorna.
    pub fn wait_for_stop_signal(&self) -> StopSignal {
        let poll = self.config.accept_poll().max(Duration::from_millis(10));
        loop {
            match self.stop_rx.recv_timeout(poll) {
                Ok(signal) => return signal,
                Err(RecvTimeoutError::Timeout) => {
                    if !self.server.handle().is_listening() {
                        // /close cambia el estado antes de mandar su señal
                        return self
                            .stop_rx
                            .recv_timeout(poll)
                            .unwrap_or(StopSignal::ListenerStopped);
                    }
                }
                // self.stop_tx vive mientras viva App
                Err(RecvTimeoutError::Disconnected) => return StopSignal::ListenerStopped,
            }
        }
    }

    /// Apaga en orden y espera a todos los jobs aceptados
    pub fn shutdown(&mut self, signal: StopSignal) -> Result<ShutdownReport, ServerError> {
        info!(?signal, "shutting down");

        self.server.request_stop();
        let served = self.server.wait_for_stop();
        if let Err(e) = &served {
            warn!(error = %e, "server stopped with error");
        }

        // Una conexión que pasó la admisión puede estar por hacer submit
        let limit = self.config.read_timeout() + self.config.accept_poll();
        self.server.handle().wait_idle(self.config.accept_poll(), limit);

        self.registry.await_all_complete();

        let report = ShutdownReport {
            uptime: self.started_at.elapsed(),
            stats: self.registry.stats(),
            signal,
        };
        info!(
            total = report.stats.total,
            average_ms = report.stats.average,
            uptime_secs = report.uptime.as_secs_f64(),
            "all jobs completed"
        );

        served.map(|_| report)
    }

    /// Arranca, espera la señal de stop y apaga
    pub fn run(&mut self) -> Result<ShutdownReport, ServerError> {
        self.start()?;
        let signal = self.wait_for_stop_signal();
        self.shutdown(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::thread;

    fn test_config() -> Config {
        Config {
            port: 0,
            hash_delay_ms: 100,
            accept_poll_ms: 10,
            ..Config::default()
        }
    }

    fn send(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config {
            accept_poll_ms: 0,
            ..test_config()
        };
        assert!(matches!(App::new(config), Err(ServerError::InvalidConfig(_))));
    }

    #[test]
    fn test_interrupt_waits_for_jobs() {
        let mut app = App::new(test_config()).unwrap();
        let addr = app.start().unwrap();

        let response = send(addr, "POST /hash?password=abc HTTP/1.0\r\n\r\n");
        assert!(response.ends_with("\r\n\r\n1"));

        app.stop_sender().send(StopSignal::Interrupt).unwrap();
        let signal = app.wait_for_stop_signal();
        assert_eq!(signal, StopSignal::Interrupt);

        let report = app.shutdown(signal).unwrap();
        assert_eq!(report.stats.total, 1);
        assert!(report.stats.average >= 100);
        assert_eq!(app.registry().outstanding(), 0);
    }

    #[test]
    fn test_close_endpoint_ends_wait() {
        let mut app = App::new(test_config()).unwrap();
        let addr = app.start().unwrap();

        let runner = thread::spawn(move || {
            let signal = app.wait_for_stop_signal();
            app.shutdown(signal)
        });

        let response = send(addr, "GET /close HTTP/1.0\r\n\r\n");
        assert!(response.ends_with("Sent HTTP Server close request..."));

        let report = runner.join().unwrap().unwrap();
        assert_eq!(report.signal, StopSignal::CloseRequest);
        assert_eq!(report.stats.total, 0);
    }

    #[test]
    fn test_stop_through_handle_is_noticed() {
        let mut app = App::new(test_config()).unwrap();
        app.start().unwrap();

        app.handle().request_stop();
        assert_eq!(app.wait_for_stop_signal(), StopSignal::ListenerStopped);
        assert!(app.shutdown(StopSignal::ListenerStopped).is_ok());
    }

    #[test]
    fn test_shutdown_waits_for_open_connections() {
        let mut app = App::new(test_config()).unwrap();
        let addr = app.start().unwrap();
        let handle = app.handle();

        let stream = TcpStream::connect(addr).unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while handle.active_connections() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(handle.active_connections(), 1);

        let closer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            drop(stream);
        });

        let start = Instant::now();
        app.shutdown(StopSignal::Interrupt).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(150));
        assert_eq!(handle.active_connections(), 0);
        closer.join().unwrap();
    }
}
