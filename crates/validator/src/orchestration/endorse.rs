// Path: crates/validator/src/orchestration/endorse.rs

use super::context::TaskContext;
use crate::metrics::metrics;
use anyhow::Result;
use baker_api::lifecycle::WorkScope;
use baker_api::signer::SigningDomain;
use baker_types::OperationKind;
use std::sync::Arc;

/// Endorses the head bound to `scope` when the delegate holds an endorsing
/// right at its level.
pub(crate) async fn handle_endorsement(ctx: Arc<TaskContext>, scope: WorkScope) -> Result<()> {
    let head = scope.block();
    let level = head.level;
    let store = &ctx.services.store;

    let next = store.next_right(OperationKind::Endorse, level.saturating_sub(1))?;
    if next.level() != level {
        tracing::trace!(target: "endorse", level, next = next.level(), "no endorsing right at this level");
        return Ok(());
    }
    if !ctx.gate(OperationKind::Endorse, level)? {
        return Ok(());
    }

    TaskContext::ensure_live(&scope)?;
    let forged = ctx.services.rpc.forge_endorsement(head).await?;
    TaskContext::ensure_live(&scope)?;
    let signature = ctx.sign(head, SigningDomain::Endorsement, &forged).await?;
    TaskContext::ensure_live(&scope)?;

    if ctx.settings.dry_run_endorse {
        tracing::info!(target: "endorse", level, %signature, "dry run, endorsement signed but not injected");
        return Ok(());
    }

    if !ctx.claim(OperationKind::Endorse, level, None)? {
        return Ok(());
    }
    let op_hash = ctx.services.rpc.inject_operation(&forged, &signature).await?;
    metrics().inc_injected("endorse");
    ctx.seal(OperationKind::Endorse, level, &op_hash)?;

    tracing::info!(target: "endorse", level, %op_hash, "endorsement injected");
    ctx.services
        .notifications
        .send(&format!("Injected endorsement for level {level}: {op_hash}"))
        .await;
    Ok(())
}
