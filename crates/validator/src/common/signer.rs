// Path: crates/validator/src/common/signer.rs
//! Routes signing requests to the backend selected by the persisted signer type.

use async_trait::async_trait;
use baker_api::signer::{Signer, SigningDomain};
use baker_types::error::BakerError;
use baker_types::SignerType;
use std::collections::HashMap;
use std::sync::Arc;

/// A [`Signer`] that forwards to one registered backend per [`SignerType`].
///
/// Requests for a type with no registered backend fail with
/// [`BakerError::SignerUnavailable`].
#[derive(Default, Clone)]
pub struct SignerRouter {
    backends: HashMap<SignerType, Arc<dyn Signer>>,
}

impl SignerRouter {
    /// A router with no backends.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `backend` for `signer_type`, replacing any previous one.
    pub fn with_backend(mut self, signer_type: SignerType, backend: Arc<dyn Signer>) -> Self {
        self.backends.insert(signer_type, backend);
        self
    }

    /// Whether a backend is registered for `signer_type`.
    pub fn supports(&self, signer_type: SignerType) -> bool {
        self.backends.contains_key(&signer_type)
    }
}

#[async_trait]
impl Signer for SignerRouter {
    async fn sign(
        &self,
        payload: &[u8],
        domain: SigningDomain,
        signer_type: SignerType,
    ) -> Result<String, BakerError> {
        let backend = self
            .backends
            .get(&signer_type)
            .ok_or_else(|| BakerError::SignerUnavailable(signer_type.to_string()))?;
        tracing::trace!(target: "signer", %signer_type, ?domain, len = payload.len(), "routing signing request");
        backend.sign(payload, domain, signer_type).await
    }
}
