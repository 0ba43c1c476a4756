// Path: crates/validator/src/config.rs
//! Runtime settings of the block event loop.

use baker_types::config::{BakerConfig, NetworkConstants};
use std::time::Duration;

/// The subset of [`BakerConfig`] the event loop and its tasks consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BakerSettings {
    /// Protocol constants of the configured network.
    pub constants: NetworkConstants,
    /// Sign blocks but never inject or seal them.
    pub dry_run_bake: bool,
    /// Sign endorsements but never inject or seal them.
    pub dry_run_endorse: bool,
    /// How many cycles past the head's cycle rights are prefetched.
    pub prefetch_cycles_ahead: u64,
    /// Highest baking priority requested from the node.
    pub max_baking_priority: u32,
    /// Upper bound on the wait for in-flight tasks at shutdown.
    pub shutdown_grace: Duration,
}

impl From<&BakerConfig> for BakerSettings {
    fn from(cfg: &BakerConfig) -> Self {
        Self {
            constants: cfg.constants(),
            dry_run_bake: cfg.dry_run_bake,
            dry_run_endorse: cfg.dry_run_endorse,
            prefetch_cycles_ahead: cfg.prefetch_cycles_ahead,
            max_baking_priority: cfg.max_baking_priority,
            shutdown_grace: Duration::from_secs(cfg.shutdown_grace_secs),
        }
    }
}
