// Path: crates/api/src/payout/mod.rs
//! Hook for the payout subsystem, which owns reward accounting.

use crate::lifecycle::WorkScope;
use async_trait::async_trait;
use baker_types::error::BakerError;

/// Called once per ready block, alongside the baking and endorsing tasks.
#[async_trait]
pub trait PayoutHandler: Send + Sync {
    /// Processes the block bound to `scope`. Must stop early when the scope is cancelled.
    async fn handle_block(&self, scope: &WorkScope) -> Result<(), BakerError>;
}
