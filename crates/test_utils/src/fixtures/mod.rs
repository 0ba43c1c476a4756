//! Blocks, network constants and stores for reproducible tests

use baker_storage::RedbBakerStore;
use baker_types::config::NetworkConstants;
use baker_types::{Block, BlockMetadata};
use std::sync::Arc;
use tempfile::TempDir;

/// A real base58check chain id (mainnet).
pub const CHAIN_ID: &str = "NetXdQprcVkpaWU";

/// The delegate used across the suites.
pub const DELEGATE: &str = "tz1fixtureDelegate";

/// Small cycles so tests can cross cycle boundaries cheaply.
pub fn constants() -> NetworkConstants {
    NetworkConstants {
        blocks_per_cycle: 8,
        blocks_per_commitment: 4,
        time_between_blocks: 1,
        preserved_cycles: 3,
    }
}

/// The head at `level` under [`constants`]: level 1 opens cycle 0.
pub fn block(level: u64) -> Block {
    let per_cycle = constants().blocks_per_cycle;
    let offset = level.saturating_sub(1);
    Block {
        level,
        cycle: offset / per_cycle,
        hash: format!("BL{level}"),
        metadata: BlockMetadata {
            predecessor: format!("BL{}", level.saturating_sub(1)),
            protocol: "PtHangz2aRngywmSRGGvrcTyMbbdpWdpFKuS4uMWxg2RaH9i1qx".into(),
            chain_id: CHAIN_ID.into(),
            timestamp: "2021-12-01T00:00:00Z".into(),
            cycle_position: offset % per_cycle,
        },
    }
}

/// A fresh store in a temporary directory. Keep the directory alive for as
/// long as the store is used.
pub fn temp_store() -> anyhow::Result<(TempDir, Arc<RedbBakerStore>)> {
    let dir = tempfile::tempdir()?;
    let store = RedbBakerStore::open(dir.path().join("bakerd.db"))?;
    Ok((dir, Arc::new(store)))
}

/// A temporary store with [`DELEGATE`] configured for the remote signer.
pub fn store_with_delegate() -> anyhow::Result<(TempDir, Arc<RedbBakerStore>)> {
    use baker_api::storage::DelegateStore;
    use baker_types::SignerType;

    let (dir, store) = temp_store()?;
    store.set_delegate("remote:fixture", DELEGATE)?;
    store.set_signer_type(SignerType::Remote)?;
    Ok((dir, store))
}
