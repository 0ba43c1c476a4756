// Path: crates/types/src/nonce.rs

use serde::{Deserialize, Serialize};

/// A seed nonce generated when baking a commitment level.
///
/// Stored as JSON under `nonces/<cycle>/<level>`; the seed must be revealed
/// during the following cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce {
    /// Level of the block that committed to this nonce.
    pub level: u64,
    /// The secret seed.
    #[serde(with = "hex::serde")]
    pub seed: Vec<u8>,
    /// The commitment published in the block header (`nce...`).
    #[serde(default)]
    pub seed_hash: String,
    /// Hash of the revelation operation, once injected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal_operation: Option<String>,
}

impl Nonce {
    /// Creates an unrevealed nonce.
    pub fn new(level: u64, seed: Vec<u8>, seed_hash: impl Into<String>) -> Self {
        Self {
            level,
            seed,
            seed_hash: seed_hash.into(),
            reveal_operation: None,
        }
    }

    /// Whether the revelation has already been injected.
    pub fn is_revealed(&self) -> bool {
        self.reveal_operation.is_some()
    }
}
