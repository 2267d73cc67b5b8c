//! # Hash de Passwords
//! src/jobs/hasher.rs
//!
//! El trabajo diferido del servidor: esperar un retardo fijo y luego
//! calcular el SHA-512 del password en hexadecimal (128 caracteres).

use sha2::{Digest, Sha512};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    /// Retardo antes de calcular el hash
    delay: Duration,
}

impl PasswordHasher {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Duerme `delay` y devuelve el hash. Bloquea el thread que lo llama.
    pub fn hash(&self, password: &str) -> String {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        sha512_hex(password)
    }
}

/// SHA-512 en hexadecimal minúscula
pub fn sha512_hex(input: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
