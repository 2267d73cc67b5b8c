//! # Hash Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 que calcula hashes SHA-512 de passwords de forma
//! asíncrona y se apaga sin perder trabajo en vuelo.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Parsing y manejo del protocolo HTTP/1.0
//! - `server`: Listener TCP con ciclo de vida y apagado controlado
//! - `router`: Enrutamiento de peticiones a handlers
//! - `jobs`: Registry asíncrono de jobs (tickets, barrera, stats)
//! - `app`: Orquestación del proceso completo
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use hash_server::app::App;
//! use hash_server::config::Config;
//!
//! let mut app = App::new(Config::default()).unwrap();
//! let report = app.run().unwrap();
//! println!("{} jobs", report.stats.total);
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod jobs;
pub mod router;
pub mod server;
