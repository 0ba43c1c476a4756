// Path: crates/validator/src/orchestration/status.rs

use anyhow::Result;
use baker_api::storage::BakerStore;
use baker_types::status::{BakerStatus, Readiness};
use baker_types::{Block, OperationKind};
use tokio::sync::watch;

/// Rebuilds the status snapshot from the store and publishes it.
pub(crate) fn refresh_status(
    store: &dyn BakerStore,
    head: &Block,
    readiness: Readiness,
    board: &watch::Sender<BakerStatus>,
) -> Result<()> {
    let status = BakerStatus {
        head_level: head.level,
        head_cycle: head.cycle,
        readiness,
        next_baking: store.next_right(OperationKind::Bake, head.level)?.right,
        next_endorsing: store.next_right(OperationKind::Endorse, head.level)?.right,
        last_bake: store.most_recent_seal(OperationKind::Bake)?,
        last_endorsement: store.most_recent_seal(OperationKind::Endorse)?,
    };
    board.send_replace(status);
    Ok(())
}
