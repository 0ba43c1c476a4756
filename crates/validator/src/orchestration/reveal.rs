// Path: crates/validator/src/orchestration/reveal.rs

use super::context::{Superseded, TaskContext};
use crate::metrics::metrics;
use anyhow::{anyhow, Result};
use baker_api::lifecycle::WorkScope;
use baker_api::signer::SigningDomain;
use baker_types::Nonce;
use std::sync::Arc;

/// Reveals the seed nonces committed during the previous cycle. Nonces
/// already carrying a reveal marker are skipped, so restarts do not reveal
/// twice. A nonce that fails to reveal does not hold back the others; it
/// may belong to a block whose injection never landed.
pub(crate) async fn reveal_nonces(ctx: Arc<TaskContext>, scope: WorkScope) -> Result<()> {
    let head = scope.block();
    let Some(previous_cycle) = head.cycle.checked_sub(1) else {
        return Ok(());
    };

    let pending: Vec<_> = ctx
        .services
        .store
        .nonces_for_cycle(previous_cycle)?
        .into_iter()
        .filter(|n| !n.is_revealed())
        .collect();
    if pending.is_empty() {
        return Ok(());
    }
    tracing::debug!(target: "reveal", cycle = previous_cycle, count = pending.len(), "revealing seed nonces");

    let mut failed = Vec::new();
    for nonce in pending {
        match reveal_one(&ctx, &scope, previous_cycle, &nonce).await {
            Ok(()) => {}
            Err(e) if e.is::<Superseded>() => return Err(e),
            Err(e) => {
                tracing::warn!(target: "reveal", level = nonce.level, error = %format!("{e:#}"), "seed nonce revelation failed");
                failed.push(nonce.level);
            }
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("revelation failed for levels {failed:?} of cycle {previous_cycle}"))
    }
}

async fn reveal_one(ctx: &TaskContext, scope: &WorkScope, cycle: u64, nonce: &Nonce) -> Result<()> {
    let head = scope.block();
    TaskContext::ensure_live(scope)?;
    let forged = ctx
        .services
        .rpc
        .forge_nonce_revelation(head, nonce.level, &nonce.seed)
        .await?;
    TaskContext::ensure_live(scope)?;
    let signature = ctx.sign(head, SigningDomain::Generic, &forged).await?;
    TaskContext::ensure_live(scope)?;

    if ctx.settings.dry_run_bake {
        tracing::info!(target: "reveal", level = nonce.level, "dry run, revelation signed but not injected");
        return Ok(());
    }

    let op_hash = ctx.services.rpc.inject_operation(&forged, &signature).await?;
    metrics().inc_injected("reveal");
    ctx.services.store.mark_nonce_revealed(cycle, nonce.level, &op_hash)?;
    tracing::info!(target: "reveal", level = nonce.level, %op_hash, "seed nonce revealed");
    Ok(())
}
