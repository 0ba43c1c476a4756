// Path: crates/api/src/chain/mod.rs
//! The chain RPC contract consumed by the per-block tasks.

use async_trait::async_trait;
use baker_types::error::BakerError;
use baker_types::{Block, RightEntry};
use serde::{Deserialize, Serialize};

/// On-chain registration state of a delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DelegateStatus {
    /// The account is registered as a delegate.
    pub registered: bool,
    /// The delegate has been deactivated for inactivity.
    pub deactivated: bool,
}

impl DelegateStatus {
    /// Registered and not deactivated.
    pub fn is_active(&self) -> bool {
        self.registered && !self.deactivated
    }
}

/// Header fields the daemon chooses when forging a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTemplate {
    /// Level of the new block.
    pub level: u64,
    /// Baking priority the delegate holds for that level.
    pub priority: u32,
    /// Seed nonce commitment, present on commitment levels.
    pub seed_nonce_hash: Option<String>,
}

/// Access to a chain node.
///
/// Implementations are expected to enforce their own request timeouts so that
/// a stuck call cannot hold a task indefinitely.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Cheap liveness probe.
    async fn is_healthy(&self) -> bool;

    /// The current head.
    async fn head(&self) -> Result<Block, BakerError>;

    /// Baking rights of `pkh` in `cycle`, up to `max_priority`.
    async fn baking_rights(
        &self,
        cycle: u64,
        pkh: &str,
        max_priority: u32,
    ) -> Result<Vec<RightEntry>, BakerError>;

    /// Endorsing rights of `pkh` in `cycle`.
    async fn endorsing_rights(&self, cycle: u64, pkh: &str) -> Result<Vec<RightEntry>, BakerError>;

    /// Registration state of `pkh`.
    async fn delegate_status(&self, pkh: &str) -> Result<DelegateStatus, BakerError>;

    /// Unsigned bytes of an endorsement of `head`.
    async fn forge_endorsement(&self, head: &Block) -> Result<Vec<u8>, BakerError>;

    /// Unsigned bytes of a seed nonce revelation for the nonce committed at `level`.
    async fn forge_nonce_revelation(
        &self,
        head: &Block,
        level: u64,
        seed: &[u8],
    ) -> Result<Vec<u8>, BakerError>;

    /// Unsigned bytes of a block header built on top of `head`.
    async fn forge_block(&self, head: &Block, template: &BlockTemplate)
        -> Result<Vec<u8>, BakerError>;

    /// Injects a signed operation and returns its hash.
    async fn inject_operation(&self, forged: &[u8], signature: &str) -> Result<String, BakerError>;

    /// Injects a signed block and returns its hash.
    async fn inject_block(&self, forged: &[u8], signature: &str) -> Result<String, BakerError>;
}
