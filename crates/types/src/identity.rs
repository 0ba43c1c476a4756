// Path: crates/types/src/identity.rs

use crate::error::BakerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selects which external signing backend handles cryptographic operations.
///
/// The discriminants are the values persisted under `config/signertype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerType {
    /// A key held by the local wallet.
    Local = 1,
    /// A hardware wallet.
    Ledger = 2,
    /// A remote signer reached over HTTP.
    Remote = 3,
}

impl SignerType {
    /// The persisted representation.
    pub fn as_u64(self) -> u64 {
        self as u64
    }
}

impl TryFrom<u64> for SignerType {
    type Error = BakerError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SignerType::Local),
            2 => Ok(SignerType::Ledger),
            3 => Ok(SignerType::Remote),
            other => Err(BakerError::UnknownSignerType(other)),
        }
    }
}

impl fmt::Display for SignerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignerType::Local => "local",
            SignerType::Ledger => "ledger",
            SignerType::Remote => "remote",
        })
    }
}

impl FromStr for SignerType {
    type Err = BakerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" | "wallet" => Ok(SignerType::Local),
            "ledger" => Ok(SignerType::Ledger),
            "remote" => Ok(SignerType::Remote),
            other => Err(BakerError::Config(format!("unknown signer type '{other}'"))),
        }
    }
}

/// The operator's delegate as persisted in the `config` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateIdentity {
    /// Public key hash (`tz1...`).
    pub pkh: String,
    /// Reference to the secret key, interpreted by the signer backend.
    pub secret_key_ref: String,
    /// Selected signer backend, if one has been configured.
    pub signer_type: Option<SignerType>,
    /// Hardware-wallet derivation path, for ledger setups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bip_path: Option<String>,
}

impl DelegateIdentity {
    /// A delegate is registered once a public key hash has been stored.
    pub fn is_registered(&self) -> bool {
        !self.pkh.is_empty()
    }
}
