// Path: crates/validator/src/orchestration/payouts.rs

use super::context::TaskContext;
use anyhow::Result;
use baker_api::lifecycle::WorkScope;
use std::sync::Arc;

/// Hands the block to the payout subsystem, if one is wired in.
pub(crate) async fn handle_payouts(ctx: Arc<TaskContext>, scope: WorkScope) -> Result<()> {
    let Some(handler) = ctx.services.payouts.clone() else {
        return Ok(());
    };
    TaskContext::ensure_live(&scope)?;
    handler.handle_block(&scope).await?;
    Ok(())
}
