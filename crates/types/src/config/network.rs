// Path: crates/types/src/config/network.rs

use crate::error::BakerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The chains this daemon knows how to operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network.
    Mainnet,
    /// Granada test network.
    Granadanet,
    /// Hangzhou test network.
    Hangzhounet,
}

/// Protocol constants that drive scheduling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConstants {
    /// Number of levels in one cycle.
    pub blocks_per_cycle: u64,
    /// Every `blocks_per_commitment`-th level must carry a seed nonce commitment.
    pub blocks_per_commitment: u64,
    /// Minimal delay between two blocks, in seconds.
    pub time_between_blocks: u64,
    /// Number of cycles for which rights are computable in advance.
    pub preserved_cycles: u64,
}

impl NetworkConstants {
    /// Whether a block at `cycle_position` must commit to a seed nonce.
    pub fn requires_commitment(&self, cycle_position: u64) -> bool {
        self.blocks_per_commitment > 0 && (cycle_position + 1) % self.blocks_per_commitment == 0
    }
}

impl Network {
    /// All networks accepted on the command line.
    pub const ALL: [Network; 3] = [Network::Mainnet, Network::Granadanet, Network::Hangzhounet];

    /// The protocol constants for this network.
    pub fn constants(&self) -> NetworkConstants {
        match self {
            Network::Mainnet => NetworkConstants {
                blocks_per_cycle: 8192,
                blocks_per_commitment: 64,
                time_between_blocks: 30,
                preserved_cycles: 5,
            },
            Network::Granadanet | Network::Hangzhounet => NetworkConstants {
                blocks_per_cycle: 4096,
                blocks_per_commitment: 32,
                time_between_blocks: 15,
                preserved_cycles: 3,
            },
        }
    }

    /// RPC endpoints seeded into a brand new database.
    pub fn default_endpoints(&self) -> &'static [&'static str] {
        match self {
            Network::Mainnet => &[
                "http://mainnet-us.rpc.bakerd.dev",
                "http://mainnet-eu.rpc.bakerd.dev",
            ],
            Network::Granadanet => &[
                "http://granadanet-us.rpc.bakerd.dev",
                "http://granadanet-eu.rpc.bakerd.dev",
            ],
            Network::Hangzhounet => &["http://hangzhounet-us.rpc.bakerd.dev"],
        }
    }

    /// Comma-separated list of network names, for help texts.
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Granadanet => "granadanet",
            Network::Hangzhounet => "hangzhounet",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = BakerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "granadanet" => Ok(Network::Granadanet),
            "hangzhounet" => Ok(Network::Hangzhounet),
            other => Err(BakerError::UnknownNetwork(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_networks_case_insensitively() {
        assert_eq!("Mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("hangzhounet".parse::<Network>().unwrap(), Network::Hangzhounet);
        assert!(matches!(
            "florencenet".parse::<Network>(),
            Err(BakerError::UnknownNetwork(_))
        ));
    }

    #[test]
    fn commitment_levels_are_the_last_of_each_window() {
        let c = Network::Hangzhounet.constants();
        assert!(c.requires_commitment(31));
        assert!(c.requires_commitment(63));
        assert!(!c.requires_commitment(0));
        assert!(!c.requires_commitment(32));
    }
}
