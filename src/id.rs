//! Identifier generation seam
//!
//! All row, table, column, and transaction ids come from one injected
//! generator so tests can substitute deterministic values.

use std::sync::Mutex;

/// Identifier generator capability
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random UUID v4 generator, the production default
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic sequence generator for tests: `prefix-1`, `prefix-2`, ...
#[derive(Debug)]
pub struct SequenceIdGenerator {
    prefix: String,
    counter: Mutex<u64>,
}

impl SequenceIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Mutex::new(0),
        }
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn generate(&self) -> String {
        let mut counter = self.counter.lock().expect("id counter poisoned");
        *counter += 1;
        format!("{}-{}", self.prefix, counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_generator_unique() {
        let generator = UuidIdGenerator;
        assert_ne!(generator.generate(), generator.generate());
    }

    #[test]
    fn test_sequence_generator() {
        let generator = SequenceIdGenerator::new("row");
        assert_eq!(generator.generate(), "row-1");
        assert_eq!(generator.generate(), "row-2");
    }
}
