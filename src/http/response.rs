//! # Construcción de Respuestas HTTP
//!
//! ## Formato de una respuesta HTTP/1.0
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/plain; charset=utf-8\r\n
//! Content-Length: 1\r\n
//! \r\n
//! 1
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use hash_server::http::{Response, StatusCode};
//!
//! let response = Response::text(StatusCode::Ok, "1");
//! let bytes = response.to_bytes();
//! assert!(bytes.ends_with(b"\r\n\r\n1"));
//! ```

use super::StatusCode;
use std::collections::BTreeMap;

/// Respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers ordenados para que la salida sea determinista
    headers: BTreeMap<String, String>,

    body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega (o reemplaza) un header
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el body y su `Content-Length`
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self.headers
            .insert("Content-Length".to_string(), self.body.len().to_string());
        self
    }

    /// Respuesta de texto plano
    pub fn text(status: StatusCode, body: &str) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(body)
    }

    /// Respuesta JSON exitosa (200 OK)
    pub fn json(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Quita el body pero conserva `Content-Length` (respuestas a HEAD)
    pub fn strip_body(&mut self) {
        self.body.clear();
    }

    /// Serializa la respuesta: status line, headers, línea vacía y body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(128 + self.body.len());

        result.extend_from_slice(format!("HTTP/1.0 {}\r\n", self.status).as_bytes());
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        result.extend_from_slice(b"\r\n");
        result.extend_from_slice(&self.body);

        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body como texto (lossy)
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
