// Path: crates/validator/src/orchestration/bake.rs

use super::context::{Superseded, TaskContext};
use crate::metrics::metrics;
use anyhow::Result;
use baker_api::chain::BlockTemplate;
use baker_api::lifecycle::WorkScope;
use baker_api::signer::SigningDomain;
use baker_client::encoding::nonce_hash;
use baker_types::{Nonce, OperationKind};
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;

const SEED_LEN: usize = 32;

/// Bakes the level following the head bound to `scope` when the delegate
/// holds a baking right for it. Non-zero priorities wait their slot first.
pub(crate) async fn handle_bake(ctx: Arc<TaskContext>, scope: WorkScope) -> Result<()> {
    let head = scope.block();
    let level = head.next_level();
    let store = &ctx.services.store;

    let next = store.next_right(OperationKind::Bake, head.level)?;
    let priority = match next.right {
        Some(right) if right.level == level => right.priority.unwrap_or(0),
        _ => {
            tracing::trace!(target: "bake", level, next = next.level(), "no baking right for the next level");
            return Ok(());
        }
    };
    if !ctx.gate(OperationKind::Bake, level)? {
        return Ok(());
    }

    if priority > 0 {
        let delay = Duration::from_secs(
            u64::from(priority).saturating_mul(ctx.settings.constants.time_between_blocks),
        );
        tracing::info!(target: "bake", level, priority, ?delay, "waiting for baking slot");
        tokio::select! {
            _ = scope.cancelled() => return Err(Superseded.into()),
            _ = tokio::time::sleep(delay) => {}
        }
        if !ctx.gate(OperationKind::Bake, level)? {
            return Ok(());
        }
    }

    let (cycle, position) = head.next_position(&ctx.settings.constants);
    let nonce = ctx
        .settings
        .constants
        .requires_commitment(position)
        .then(|| {
            let mut seed = vec![0u8; SEED_LEN];
            rand::thread_rng().fill_bytes(&mut seed);
            let hash = nonce_hash(&seed);
            Nonce::new(level, seed, hash)
        });

    let template = BlockTemplate {
        level,
        priority,
        seed_nonce_hash: nonce.as_ref().map(|n| n.seed_hash.clone()),
    };

    TaskContext::ensure_live(&scope)?;
    let forged = ctx.services.rpc.forge_block(head, &template).await?;
    TaskContext::ensure_live(&scope)?;
    let signature = ctx.sign(head, SigningDomain::Block, &forged).await?;
    TaskContext::ensure_live(&scope)?;

    if ctx.settings.dry_run_bake {
        tracing::info!(target: "bake", level, priority, %signature, "dry run, block signed but not injected");
        return Ok(());
    }

    // The committed nonce lands with the intent, before the block can reach the chain.
    if !ctx.claim(OperationKind::Bake, level, nonce.as_ref().map(|n| (cycle, n)))? {
        return Ok(());
    }
    if let Some(nonce) = &nonce {
        tracing::debug!(target: "bake", level, cycle, seed_hash = %nonce.seed_hash, "seed nonce stored");
    }
    let block_hash = ctx.services.rpc.inject_block(&forged, &signature).await?;
    metrics().inc_injected("bake");
    ctx.seal(OperationKind::Bake, level, &block_hash)?;

    tracing::info!(target: "bake", level, priority, %block_hash, "block injected");
    ctx.services
        .notifications
        .send(&format!("Baked block {block_hash} at level {level} (priority {priority})"))
        .await;
    Ok(())
}
