//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Este módulo implementa el router que mapea paths HTTP a handlers específicos.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router → Handler(&Request, &AppState) → Response
//! ```
//!
//! El router mira solo el primer segmento del path (`/hash/42` → `hash`);
//! el resto lo interpreta el handler. Si no hay handler retorna 404.

use crate::http::{Method, Request, Response, StatusCode};
use crate::jobs::handlers::{hash_handler, stats_handler};
use crate::server::control::close_handler;
use crate::server::state::AppState;

/// Tipo de función handler
///
/// Un handler recibe el Request y el estado compartido, y retorna una Response
pub type Handler = fn(&Request, &AppState) -> Response;

pub const SERVER_NAME: &str = "HashServer/1.0";

/// Router que mapea el primer segmento del path a un handler
pub struct Router {
    routes: Vec<(String, Handler)>,
}

impl Router {
    /// Crea un nuevo router vacío
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Router con los endpoints del servicio: `/hash`, `/stats` y `/close`
    pub fn with_routes() -> Self {
        let mut router = Self::new();
        router.register("hash", hash_handler);
        router.register("stats", stats_handler);
        router.register("close", close_handler);
        router
    }

    /// Registra un handler para un segmento (se aceptan `"/hash"` y `"hash"`)
    pub fn register(&mut self, segment: &str, handler: Handler) {
        self.routes
            .push((segment.trim_matches('/').to_string(), handler));
    }

    /// Encuentra y ejecuta el handler apropiado para un request
    pub fn route(&self, request: &Request, state: &AppState) -> Response {
        let segment = request.path_segments().first().copied().unwrap_or("");

        let mut response = match self.routes.iter().find(|(name, _)| name == segment) {
            Some((_, handler)) => handler(request, state),
            None => Response::text(
                StatusCode::NotFound,
                &format!("Request not supported: {}", request.path()),
            ),
        };

        self.add_common_headers(&mut response);
        if request.method() == Method::HEAD {
            response.strip_body();
        }
        response
    }

    /// Agrega headers comunes a todas las respuestas
    fn add_common_headers(&self, response: &mut Response) {
        response.add_header("Server", SERVER_NAME);
        response.add_header("Connection", "close");
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
