//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor con soporte para argumentos CLI y variables
//! de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./hash_server --port 8042 --hash-delay-ms 5000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8042 HTTP_HOST=0.0.0.0 LOG_LEVEL=debug ./hash_server
//! ```

use crate::error::ServerError;
use clap::Parser;
use std::time::Duration;
use tracing::info;

/// Configuración del servidor de hashing
#[derive(Debug, Clone, Parser)]
#[command(name = "hash_server")]
#[command(about = "Servidor HTTP/1.0 de hashing diferido con apagado seguro")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8042", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha.
    ///
    /// Por defecto solo loopback; `--host 0.0.0.0` escucha en todas las
    /// interfaces.
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    // === Jobs ===

    /// Retardo fijo de cada job de hashing en milisegundos
    #[arg(long = "hash-delay-ms", default_value = "5000", env = "HASH_DELAY_MS")]
    pub hash_delay_ms: u64,

    // === Listener ===

    /// Cada cuánto el accept loop revisa el estado del servidor (ms)
    #[arg(long = "accept-poll-ms", default_value = "50", env = "ACCEPT_POLL_MS")]
    pub accept_poll_ms: u64,

    /// Timeout de lectura por conexión (ms)
    #[arg(long = "read-timeout-ms", default_value = "5000", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Tamaño máximo de un request (headers + body)
    #[arg(long = "max-request-bytes", default_value = "65536", env = "MAX_REQUEST_BYTES")]
    pub max_request_bytes: usize,
}

/// Retardo máximo aceptado para un job (10 minutos)
const MAX_HASH_DELAY_MS: u64 = 600_000;

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use hash_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8042");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn hash_delay(&self) -> Duration {
        Duration::from_millis(self.hash_delay_ms)
    }

    pub fn accept_poll(&self) -> Duration {
        Duration::from_millis(self.accept_poll_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.host.trim().is_empty() {
            return Err(ServerError::InvalidConfig("host must not be empty".to_string()));
        }
        if self.accept_poll_ms == 0 {
            return Err(ServerError::InvalidConfig("accept poll interval must be > 0".to_string()));
        }
        if self.read_timeout_ms == 0 {
            return Err(ServerError::InvalidConfig("read timeout must be > 0".to_string()));
        }
        if self.max_request_bytes < 256 {
            return Err(ServerError::InvalidConfig("max request bytes must be >= 256".to_string()));
        }
        if self.hash_delay_ms > MAX_HASH_DELAY_MS {
            return Err(ServerError::InvalidConfig(format!(
                "hash delay must be <= {} ms",
                MAX_HASH_DELAY_MS
            )));
        }
        Ok(())
    }

    /// Reporta la configuración efectiva
    pub fn log_summary(&self) {
        info!(
            address = %self.address(),
            hash_delay_ms = self.hash_delay_ms,
            accept_poll_ms = self.accept_poll_ms,
            read_timeout_ms = self.read_timeout_ms,
            max_request_bytes = self.max_request_bytes,
            "configuration loaded"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8042,
            host: "127.0.0.1".to_string(),
            hash_delay_ms: 5_000,
            accept_poll_ms: 50,
            read_timeout_ms: 5_000,
            max_request_bytes: 65_536,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_message(config: &Config) -> String {
        match config.validate() {
            Err(ServerError::InvalidConfig(msg)) => msg,
            other => panic!("expected invalid config, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8042);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.hash_delay(), Duration::from_secs(5));
        assert_eq!(config.accept_poll(), Duration::from_millis(50));
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "0.0.0.0".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_ephemeral_port_and_zero_delay() {
        let mut config = Config::default();
        config.port = 0;
        config.hash_delay_ms = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_host() {
        let mut config = Config::default();
        config.host = "  ".to_string();
        assert!(invalid_message(&config).contains("host"));
    }

    #[test]
    fn test_validate_invalid_poll() {
        let mut config = Config::default();
        config.accept_poll_ms = 0;
        assert!(invalid_message(&config).contains("poll"));
    }

    #[test]
    fn test_validate_invalid_read_timeout() {
        let mut config = Config::default();
        config.read_timeout_ms = 0;
        assert!(invalid_message(&config).contains("read timeout"));
    }

    #[test]
    fn test_validate_small_request_limit() {
        let mut config = Config::default();
        config.max_request_bytes = 16;
        assert!(invalid_message(&config).contains("max request bytes"));
    }

    #[test]
    fn test_validate_delay_too_long() {
        let mut config = Config::default();
        config.hash_delay_ms = MAX_HASH_DELAY_MS + 1;
        assert!(invalid_message(&config).contains("hash delay"));
    }

    #[test]
    fn test_parse_from_args() {
        let config = Config::parse_from([
            "hash_server",
            "--port",
            "9000",
            "--hash-delay-ms",
            "10",
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.hash_delay_ms, 10);
    }

    #[test]
    fn test_cli_default_host_matches_default() {
        let config = Config::parse_from(["hash_server"]);
        assert_eq!(config.host, Config::default().host);

        let config = Config::parse_from(["hash_server", "--host", "0.0.0.0"]);
        assert_eq!(config.address(), "0.0.0.0:8042");
        assert!(config.validate().is_ok());
    }
}
