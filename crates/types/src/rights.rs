// Path: crates/types/src/rights.rs

use serde::{Deserialize, Serialize};

/// One future opportunity for the local delegate.
///
/// Baking rights carry a priority; endorsing rights are presence-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightEntry {
    /// The level of the opportunity.
    pub level: u64,
    /// Baking priority (0 is the best). `None` for endorsing rights.
    pub priority: Option<u32>,
}

impl RightEntry {
    /// A baking right at `level` with `priority`.
    pub fn baking(level: u64, priority: u32) -> Self {
        Self {
            level,
            priority: Some(priority),
        }
    }

    /// An endorsing right at `level`.
    pub fn endorsing(level: u64) -> Self {
        Self {
            level,
            priority: None,
        }
    }
}

/// Result of a rights lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NextRight {
    /// The first right strictly above the queried level, if one is cached.
    pub right: Option<RightEntry>,
    /// Highest cycle for which rights have been fetched.
    pub highest_cycle_fetched: u64,
}

impl NextRight {
    /// Level of the next right, or 0 when none is known yet.
    pub fn level(&self) -> u64 {
        self.right.map(|r| r.level).unwrap_or(0)
    }
}
