//! # Códigos de Estado HTTP
//!
//! Códigos de estado que usa el servidor.

/// Códigos de estado HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok = 200,

    /// 202 Accepted - El job existe pero sigue procesándose
    Accepted = 202,

    /// 400 Bad Request - Ticket malformado o ausente
    BadRequest = 400,

    /// 404 Not Found - Ruta o ticket desconocido
    NotFound = 404,

    /// 405 Method Not Allowed
    MethodNotAllowed = 405,

    /// 500 Internal Server Error - El job falló
    InternalServerError = 500,

    /// 503 Service Unavailable - No se pudo despachar el job
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use hash_server::http::StatusCode;
    /// assert_eq!(StatusCode::Accepted.as_u16(), 202);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Accepted => "Accepted",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
