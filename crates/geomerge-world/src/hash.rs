//! Deterministic string hashing into the unit interval.
//!
//! World generation is driven entirely by [`SpawnHasher::unit_interval`]: the
//! same key must map to the same value on every platform and across process
//! restarts, so nothing here may depend on runtime-seeded state (which rules
//! out `std::collections::hash_map::DefaultHasher`).
//!
//! The default implementation is [`Blake3Hasher`]. Cryptographic strength is
//! not needed, but BLAKE3 is fast, portable, and already part of the stack.

// ---------------------------------------------------------------------------
// SpawnHasher
// ---------------------------------------------------------------------------

/// Maps an arbitrary string key to a reproducible value in `[0, 1)`.
///
/// Implementations must be pure: identical keys produce identical outputs.
/// The trait exists so that tests can substitute instrumented doubles (for
/// example, to count how often the generator is consulted).
pub trait SpawnHasher {
    /// Hash `key` into the half-open interval `[0, 1)`.
    fn unit_interval(&self, key: &str) -> f64;
}

impl<H: SpawnHasher + ?Sized> SpawnHasher for &H {
    fn unit_interval(&self, key: &str) -> f64 {
        (**self).unit_interval(key)
    }
}

// ---------------------------------------------------------------------------
// Blake3Hasher
// ---------------------------------------------------------------------------

/// BLAKE3-backed [`SpawnHasher`].
///
/// The first 8 bytes of the digest are read as a little-endian `u64`; the top
/// 53 bits become the mantissa of the result, so every output is exactly
/// representable as an `f64` and strictly less than 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3Hasher;

impl SpawnHasher for Blake3Hasher {
    fn unit_interval(&self, key: &str) -> f64 {
        let digest = blake3::hash(key.as_bytes());
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest.as_bytes()[..8]);
        let bits = u64::from_le_bytes(word) >> 11;
        bits as f64 / (1u64 << 53) as f64
    }
}

/// Hash `key` into `[0, 1)` with the default [`Blake3Hasher`].
pub fn unit_hash(key: &str) -> f64 {
    Blake3Hasher.unit_interval(key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
