// Path: crates/api/src/signer/mod.rs
//! Signing backends.

use async_trait::async_trait;
use baker_types::error::BakerError;
use baker_types::SignerType;
use serde::{Deserialize, Serialize};

/// What is being signed. Signers use it to pick the watermark prefix and
/// to apply their own high-water-mark checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningDomain {
    /// A block header.
    Block,
    /// An endorsement.
    Endorsement,
    /// Any other operation (nonce revelation).
    Generic,
}

impl SigningDomain {
    /// The magic byte prefixed to the payload before hashing.
    pub fn magic_byte(self) -> u8 {
        match self {
            SigningDomain::Block => 0x01,
            SigningDomain::Endorsement => 0x02,
            SigningDomain::Generic => 0x03,
        }
    }
}

/// Produces signatures for the configured delegate.
///
/// The daemon never holds key material itself; it only routes payloads to
/// the backend selected by the persisted [`SignerType`].
#[async_trait]
pub trait Signer: Send + Sync {
    /// Signs `payload` and returns the base58check signature.
    async fn sign(
        &self,
        payload: &[u8],
        domain: SigningDomain,
        signer_type: SignerType,
    ) -> Result<String, BakerError>;
}
