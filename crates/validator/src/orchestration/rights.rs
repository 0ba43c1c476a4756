// Path: crates/validator/src/orchestration/rights.rs
//! Keeps the rights cache filled ahead of the head and trims what fell behind.

use super::context::TaskContext;
use anyhow::{Context, Result};
use baker_types::{Block, OperationKind};
use std::sync::Arc;

/// First cycle that still needs fetching for a kind whose cursor is `cursor`.
/// A zero cursor means nothing was ever fetched.
fn first_missing_cycle(cursor: u64, head_cycle: u64) -> u64 {
    if cursor == 0 {
        head_cycle
    } else {
        cursor.saturating_add(1).max(head_cycle)
    }
}

/// Fetches rights for every cycle up to `prefetch_cycles_ahead` past the
/// head's cycle, then drops entries older than the previous cycle.
pub(crate) async fn prefetch_rights(ctx: Arc<TaskContext>, head: Block) -> Result<()> {
    let Some(pkh) = ctx.delegate_pkh()? else {
        return Ok(());
    };
    let store = &ctx.services.store;
    let rpc = &ctx.services.rpc;
    let target = head.cycle.saturating_add(ctx.settings.prefetch_cycles_ahead);

    for kind in OperationKind::ALL {
        let cursor = store.highest_cycle_fetched(kind)?;
        for cycle in first_missing_cycle(cursor, head.cycle)..=target {
            let rights = match kind {
                OperationKind::Bake => {
                    rpc.baking_rights(cycle, &pkh, ctx.settings.max_baking_priority)
                        .await
                }
                OperationKind::Endorse => rpc.endorsing_rights(cycle, &pkh).await,
            }
            .with_context(|| format!("fetching {kind} rights for cycle {cycle}"))?;
            store.save_rights_for_cycle(kind, cycle, &rights)?;
            tracing::info!(target: "rights", %kind, cycle, count = rights.len(), "rights cached");
        }

        let horizon = head
            .first_level_of_cycle()
            .saturating_sub(ctx.settings.constants.blocks_per_cycle);
        let pruned = store.prune_rights_before(kind, horizon)?;
        if pruned > 0 {
            tracing::debug!(target: "rights", %kind, pruned, before = horizon, "pruned stale rights");
        }
    }
    Ok(())
}
