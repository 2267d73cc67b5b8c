//! # Módulo HTTP
//!
//! Implementación mínima de HTTP/1.0, sin librerías de alto nivel:
//!
//! - Lectura y parsing de requests (incluyendo body de formularios)
//! - Construcción de responses
//! - Status codes
//!
//! Cada conexión atiende un solo request y se cierra (`Connection: close`).

pub mod request;
pub mod response;
pub mod status;

pub use request::{read_request, Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
