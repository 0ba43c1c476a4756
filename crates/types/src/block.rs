// Path: crates/types/src/block.rs

use crate::config::NetworkConstants;
use serde::{Deserialize, Serialize};

/// A chain head as observed by the chain monitor.
///
/// Immutable once observed; each value drives exactly one orchestration round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block height.
    pub level: u64,
    /// Cycle containing `level`.
    pub cycle: u64,
    /// Block hash (base58check, `B...`).
    pub hash: String,
    /// Additional header and metadata fields needed to forge operations on top of this block.
    pub metadata: BlockMetadata,
}

/// Header/metadata fields carried alongside a [`Block`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Hash of the predecessor block.
    #[serde(default)]
    pub predecessor: String,
    /// Hash of the protocol active at this block.
    #[serde(default)]
    pub protocol: String,
    /// Chain identifier.
    #[serde(default)]
    pub chain_id: String,
    /// RFC 3339 timestamp of the block header.
    #[serde(default)]
    pub timestamp: String,
    /// Zero-based position of `level` inside its cycle.
    #[serde(default)]
    pub cycle_position: u64,
}

impl Block {
    /// The level a block baked on top of this head would have.
    pub fn next_level(&self) -> u64 {
        self.level + 1
    }

    /// Cycle and in-cycle position of the level following this head.
    pub fn next_position(&self, constants: &NetworkConstants) -> (u64, u64) {
        let next = self.metadata.cycle_position + 1;
        if next >= constants.blocks_per_cycle {
            (self.cycle + 1, 0)
        } else {
            (self.cycle, next)
        }
    }

    /// First level of the cycle containing this head.
    pub fn first_level_of_cycle(&self) -> u64 {
        self.level.saturating_sub(self.metadata.cycle_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;

    fn head(level: u64, cycle: u64, position: u64) -> Block {
        Block {
            level,
            cycle,
            hash: format!("B{level}"),
            metadata: BlockMetadata {
                cycle_position: position,
                ..Default::default()
            },
        }
    }

    #[test]
    fn next_position_rolls_over_cycle_boundary() {
        let constants = Network::Hangzhounet.constants();
        let last = head(8191, 1, constants.blocks_per_cycle - 1);
        assert_eq!(last.next_position(&constants), (2, 0));

        let mid = head(5000, 1, 903);
        assert_eq!(mid.next_position(&constants), (1, 904));
    }

    #[test]
    fn first_level_of_cycle_subtracts_position() {
        assert_eq!(head(5000, 1, 903).first_level_of_cycle(), 4097);
    }
}
