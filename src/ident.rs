//! Deterministic identifier generation (§4.1).
//!
//! Mirrors the original's `make_uuid`/`reset_uuid_counter` module pair, but
//! as an owned generator rather than process-wide global state, so tests can
//! hold independent instances instead of serializing on a shared counter.

use uuid::Uuid;

const NAMESPACE: Uuid = Uuid::from_bytes([
    0xa1, 0xb2, 0xc3, 0xd4, 0xe5, 0xf6, 0x78, 0x90, 0xab, 0xcd, 0xef, 0x12, 0x34, 0x56, 0x78, 0x90,
]);

/// Generates version-5 UUIDs from a fixed namespace, falling back to a
/// sequential counter-derived name when the caller supplies none.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a UUID for `name`, or the next sequential identifier if
    /// `name` is empty.
    pub fn make(&mut self, name: &str) -> Uuid {
        if name.is_empty() {
            self.counter += 1;
            let auto = format!("odbpp-{}", self.counter);
            Uuid::new_v5(&NAMESPACE, auto.as_bytes())
        } else {
            Uuid::new_v5(&NAMESPACE, name.as_bytes())
        }
    }

    /// Reset the sequential counter. Test-only; never called at runtime.
    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_uuids_are_deterministic() {
        let mut gen1 = IdGenerator::new();
        let mut gen2 = IdGenerator::new();
        assert_eq!(gen1.make("test-name"), gen2.make("test-name"));
    }

    #[test]
    fn sequential_uuids_differ() {
        let mut gen = IdGenerator::new();
        let a = gen.make("");
        let b = gen.make("");
        assert_ne!(a, b);
    }

    #[test]
    fn reset_restarts_sequence() {
        let mut gen = IdGenerator::new();
        let a = gen.make("");
        gen.reset();
        let b = gen.make("");
        assert_eq!(a, b);
    }
}
