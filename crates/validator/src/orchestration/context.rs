// Path: crates/validator/src/orchestration/context.rs

use crate::common::NotificationService;
use crate::config::BakerSettings;
use crate::metrics::metrics;
use anyhow::{anyhow, Context, Result};
use baker_api::chain::ChainRpc;
use baker_api::lifecycle::WorkScope;
use baker_api::payout::PayoutHandler;
use baker_api::signer::{Signer, SigningDomain};
use baker_api::storage::BakerStore;
use baker_client::encoding::watermarked;
use baker_types::{Block, GateDecision, Nonce, OperationKind};
use std::sync::Arc;
use thiserror::Error;

/// The collaborators every task needs, assembled by the composition root.
#[derive(Clone)]
pub struct BakerServices {
    /// All repositories, backed by one store.
    pub store: Arc<dyn BakerStore>,
    /// The chain node.
    pub rpc: Arc<dyn ChainRpc>,
    /// The signer, usually a [`crate::SignerRouter`].
    pub signer: Arc<dyn Signer>,
    /// Operator notifications.
    pub notifications: Arc<NotificationService>,
    /// The payout subsystem, when one is wired in.
    pub payouts: Option<Arc<dyn PayoutHandler>>,
}

/// A task noticed that its work-scope was cancelled before submitting.
#[derive(Debug, Error)]
#[error("superseded by a newer head")]
pub struct Superseded;

/// Shared state handed to every dispatched task.
pub(crate) struct TaskContext {
    pub services: BakerServices,
    pub settings: BakerSettings,
}

impl TaskContext {
    /// Fails with [`Superseded`] once `scope` is cancelled.
    pub fn ensure_live(scope: &WorkScope) -> Result<()> {
        if scope.is_cancelled() {
            return Err(Superseded.into());
        }
        Ok(())
    }

    /// The delegate's public key hash, or `None` when none is configured.
    pub fn delegate_pkh(&self) -> Result<Option<String>> {
        let (_, pkh) = self.services.store.delegate()?;
        Ok((!pkh.is_empty()).then_some(pkh))
    }

    /// Asks the watermark gate whether `kind` may be produced at `level`.
    /// Refusals are logged and counted.
    pub fn gate(&self, kind: OperationKind, level: u64) -> Result<bool> {
        let decision = self.services.store.check_gate(kind, level)?;
        Ok(Self::admitted(kind, level, decision))
    }

    /// Claims (kind, level) right before submission, persisting `commitment`
    /// with the intent. `false` means another claimant or a seal got there
    /// first and nothing may be submitted.
    pub fn claim(&self, kind: OperationKind, level: u64, commitment: Option<(u64, &Nonce)>) -> Result<bool> {
        let decision = self
            .services
            .store
            .record_intent_with_nonce(kind, level, commitment)
            .with_context(|| format!("claiming {kind} at level {level}"))?;
        Ok(Self::admitted(kind, level, decision))
    }

    fn admitted(kind: OperationKind, level: u64, decision: GateDecision) -> bool {
        let reason = match decision {
            GateDecision::Proceed => return true,
            GateDecision::AtOrBelowWatermark { watermark } => {
                tracing::debug!(target: "baker", %kind, level, watermark, "level already covered by the watermark");
                "watermark"
            }
            GateDecision::IntentOutstanding => {
                tracing::warn!(target: "baker", %kind, level, "unsealed submission intent outstanding, refusing to sign again");
                "intent"
            }
        };
        metrics().inc_gate_refusals(&kind.to_string(), reason);
        false
    }

    /// Applies the signing watermark for `domain` and asks the signer.
    pub async fn sign(&self, head: &Block, domain: SigningDomain, forged: &[u8]) -> Result<String> {
        let signer_type = self
            .services
            .store
            .signer_type()?
            .ok_or_else(|| anyhow!("no signer type configured"))?;
        let payload = watermarked(domain, &head.metadata.chain_id, forged)?;
        Ok(self.services.signer.sign(&payload, domain, signer_type).await?)
    }

    /// Records the seal of a submitted artifact. Callers run this whether
    /// or not the scope was cancelled in the meantime.
    pub fn seal(&self, kind: OperationKind, level: u64, hash: &str) -> Result<()> {
        let outcome = self
            .services
            .store
            .record_seal(kind, level, hash)
            .with_context(|| format!("sealing {kind} at level {level}"))?;
        tracing::debug!(target: "baker", %kind, level, hash, ?outcome, "seal recorded");
        Ok(())
    }
}
