// Path: crates/validator/src/orchestration/readiness.rs
//! The gate evaluated on every head before tasks are dispatched.

use baker_api::chain::ChainRpc;
use baker_api::storage::BakerStore;
use baker_types::status::Readiness;

/// Checks, in order: a delegate is configured, the operator has not paused
/// the daemon, the node answers, and the delegate is active on chain.
///
/// Store failures surface as [`Readiness::Unreachable`] so a broken store
/// never lets tasks through.
pub async fn evaluate(store: &dyn BakerStore, rpc: &dyn ChainRpc) -> Readiness {
    let pkh = match store.delegate() {
        Ok((_, pkh)) if pkh.is_empty() => return Readiness::NoDelegate,
        Ok((_, pkh)) => pkh,
        Err(e) => return Readiness::Unreachable(format!("store: {e}")),
    };
    match store.is_paused() {
        Ok(true) => return Readiness::Paused,
        Ok(false) => {}
        Err(e) => return Readiness::Unreachable(format!("store: {e}")),
    }
    if !rpc.is_healthy().await {
        return Readiness::Unreachable("node is not bootstrapped or not responding".into());
    }
    match rpc.delegate_status(&pkh).await {
        Ok(status) if status.is_active() => Readiness::Ready,
        Ok(status) => {
            tracing::debug!(target: "baker", %pkh, ?status, "delegate not active");
            Readiness::NotRegistered
        }
        Err(e) => Readiness::Unreachable(e.to_string()),
    }
}
