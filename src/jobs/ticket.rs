//! # Tickets de Jobs
//! src/jobs/ticket.rs
//!
//! Identificadores de jobs: enteros positivos, únicos durante la vida del
//! registry y estrictamente crecientes en orden de emisión.

use crate::error::TicketParseError;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identificador devuelto al encolar un job
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn new(value: u64) -> Self {
        Ticket(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Ticket {
    type Err = TicketParseError;

    /// Parsea un ticket desde un segmento de path.
    ///
    /// Solo acepta dígitos decimales (sin signo ni espacios).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TicketParseError::Missing);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TicketParseError::Malformed(s.to_string()));
        }
        s.parse::<u64>()
            .map(Ticket)
            .map_err(|_| TicketParseError::Malformed(s.to_string()))
    }
}

/// Emisor de tickets thread-safe
#[derive(Debug, Default)]
pub struct TicketAllocator {
    /// Último ticket emitido (0 = ninguno)
    last: AtomicU64,
}

impl TicketAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emite el siguiente ticket. Nunca reutiliza valores.
    pub fn next(&self) -> Ticket {
        Ticket(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Número de tickets emitidos hasta ahora
    pub fn issued(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_first_ticket_is_one() {
        let allocator = TicketAllocator::new();
        assert_eq!(allocator.next(), Ticket::new(1));
        assert_eq!(allocator.next(), Ticket::new(2));
        assert_eq!(allocator.issued(), 2);
    }

    #[test]
    fn test_concurrent_allocation_is_unique() {
        let allocator = Arc::new(TicketAllocator::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let allocator = Arc::clone(&allocator);
            handles.push(thread::spawn(move || {
                (0..250).map(|_| allocator.next().value()).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "ticket {} issued twice", value);
            }
        }

        let expected: HashSet<u64> = (1..=2000).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_parse_ticket() {
        assert_eq!("42".parse::<Ticket>(), Ok(Ticket::new(42)));
        assert_eq!("".parse::<Ticket>(), Err(TicketParseError::Missing));
        assert_eq!(
            "X2X".parse::<Ticket>(),
            Err(TicketParseError::Malformed("X2X".to_string()))
        );
        assert!("-1".parse::<Ticket>().is_err());
        assert!("+1".parse::<Ticket>().is_err());
        assert!("99999999999999999999999".parse::<Ticket>().is_err());
    }

    #[test]
    fn test_ticket_display() {
        assert_eq!(Ticket::new(7).to_string(), "7");
    }
}
