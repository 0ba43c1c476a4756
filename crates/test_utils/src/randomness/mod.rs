//! Deterministic randomness for reproducible tests

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Deterministic random number generator for tests
pub struct TestRng {
    rng: StdRng,
}

impl TestRng {
    /// Create a new test RNG with the specified seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A 32-byte seed nonce.
    pub fn seed32(&mut self) -> Vec<u8> {
        let mut seed = vec![0u8; 32];
        self.rng.fill_bytes(&mut seed);
        seed
    }
}

impl Default for TestRng {
    fn default() -> Self {
        Self::new(12345)
    }
}
