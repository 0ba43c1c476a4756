// Path: crates/api/src/storage/mod.rs

//! Typed repositories over the daemon's transactional key/value store.
//!
//! Every record is owned by the store. Components read and write through
//! these traits only; the byte layout lives behind them.

use baker_types::config::Network;
use baker_types::error::ErrorCode;
use baker_types::{
    DelegateIdentity, GateDecision, NextRight, Nonce, OperationKind, RightEntry, SealOutcome,
    SealRecord, SignerType, SubmissionIntent,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Encodes a u64 into a big-endian byte array, suitable for ordered key scans.
#[inline]
pub fn be64(x: u64) -> [u8; 8] {
    x.to_be_bytes()
}

/// Decodes a big-endian u64 written by [`be64`].
#[inline]
pub fn from_be64(bytes: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}

/// Represents errors that can occur within the durable storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A generic error originating from the underlying key-value store backend (e.g., redb).
    #[error("backend error: {0}")]
    Backend(String),
    /// An error occurred while serializing data for storage.
    #[error("encode error: {0}")]
    Encode(String),
    /// An error occurred while deserializing data from storage.
    #[error("decode error: {0}")]
    Decode(String),
    /// The requested key or item was not found in the store.
    #[error("not found")]
    NotFound,
    /// A collection that must exist after initialisation is missing.
    #[error("missing bucket: {0}")]
    MissingBucket(String),
    /// A different artifact hash is already sealed at this level.
    #[error("conflicting {kind} seal at level {level}: sealed {existing}, attempted {attempted}")]
    ConflictingSeal {
        /// Artifact kind.
        kind: OperationKind,
        /// Level that is already sealed.
        level: u64,
        /// Hash already stored.
        existing: String,
        /// Hash the caller tried to record.
        attempted: String,
    },
}

impl ErrorCode for StorageError {
    fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "STORAGE_BACKEND_ERROR",
            Self::Encode(_) => "STORAGE_ENCODE_ERROR",
            Self::Decode(_) => "STORAGE_DECODE_ERROR",
            Self::NotFound => "STORAGE_NOT_FOUND",
            Self::MissingBucket(_) => "STORAGE_MISSING_BUCKET",
            Self::ConflictingSeal { .. } => "STORAGE_CONFLICTING_SEAL",
        }
    }
}

/// Durable double-sign protection, one record per [`OperationKind`].
pub trait WatermarkStore: Send + Sync {
    /// Highest sealed level for `kind`; 0 on a fresh store.
    fn watermark(&self, kind: OperationKind) -> Result<u64, StorageError>;

    /// Records that `hash` was irreversibly submitted at `level`.
    ///
    /// Never moves the watermark backward. Returns
    /// [`StorageError::ConflictingSeal`] without writing anything when a
    /// different hash is already sealed at `level`.
    fn record_seal(
        &self,
        kind: OperationKind,
        level: u64,
        hash: &str,
    ) -> Result<SealOutcome, StorageError>;

    /// The highest-level seal for `kind`, if any.
    fn most_recent_seal(&self, kind: OperationKind) -> Result<Option<SealRecord>, StorageError>;

    /// Claims (kind, level) for an irreversible submission.
    ///
    /// One write transaction refuses the claim when `level` is at or below
    /// the watermark or another intent is outstanding, and otherwise writes
    /// the intent. Anything but [`GateDecision::Proceed`] means the caller
    /// must not submit.
    fn record_intent(&self, kind: OperationKind, level: u64) -> Result<GateDecision, StorageError> {
        self.record_intent_with_nonce(kind, level, None)
    }

    /// [`Self::record_intent`], also persisting the seed nonce committed by
    /// the artifact (under its cycle) in the same transaction. A granted
    /// claim therefore never leaves a committed nonce unrecorded.
    fn record_intent_with_nonce(
        &self,
        kind: OperationKind,
        level: u64,
        commitment: Option<(u64, &Nonce)>,
    ) -> Result<GateDecision, StorageError>;

    /// Removes an intent. Also done implicitly by a successful [`Self::record_seal`].
    fn clear_intent(&self, kind: OperationKind, level: u64) -> Result<(), StorageError>;

    /// Outstanding intents for `kind`, in level order.
    fn pending_intents(&self, kind: OperationKind) -> Result<Vec<SubmissionIntent>, StorageError>;

    /// Whether an artifact of `kind` may be produced for `level`.
    fn check_gate(&self, kind: OperationKind, level: u64) -> Result<GateDecision, StorageError>;
}

/// Durable cache of future baking and endorsing opportunities.
pub trait RightsCache: Send + Sync {
    /// Stores `entries` and sets the kind's fetched-cycle cursor to `cycle`.
    fn save_rights_for_cycle(
        &self,
        kind: OperationKind,
        cycle: u64,
        entries: &[RightEntry],
    ) -> Result<(), StorageError>;

    /// The first cached right strictly above `current_level`, plus the cursor.
    fn next_right(&self, kind: OperationKind, current_level: u64)
        -> Result<NextRight, StorageError>;

    /// Highest cycle fetched for `kind`; 0 when nothing has been fetched.
    fn highest_cycle_fetched(&self, kind: OperationKind) -> Result<u64, StorageError>;

    /// Drops entries below `level` and returns how many were removed.
    fn prune_rights_before(&self, kind: OperationKind, level: u64) -> Result<usize, StorageError>;
}

/// Seed nonces awaiting revelation.
pub trait NonceStore: Send + Sync {
    /// Stores `nonce` under `cycle`, keyed by its level.
    fn save_nonce(&self, cycle: u64, nonce: &Nonce) -> Result<(), StorageError>;

    /// All decodable nonces of `cycle` in level order.
    fn nonces_for_cycle(&self, cycle: u64) -> Result<Vec<Nonce>, StorageError>;

    /// Records the revelation operation for the nonce at (cycle, level).
    fn mark_nonce_revealed(
        &self,
        cycle: u64,
        level: u64,
        operation_hash: &str,
    ) -> Result<(), StorageError>;
}

/// The operator's delegate and signer selection.
pub trait DelegateStore: Send + Sync {
    /// `(secret_key_ref, pkh)`, both empty when unset.
    fn delegate(&self) -> Result<(String, String), StorageError>;

    /// Stores the delegate.
    fn set_delegate(&self, secret_key_ref: &str, pkh: &str) -> Result<(), StorageError>;

    /// The selected signer backend, if any.
    fn signer_type(&self) -> Result<Option<SignerType>, StorageError>;

    /// Selects the signer backend.
    fn set_signer_type(&self, signer_type: SignerType) -> Result<(), StorageError>;

    /// Stores a ledger setup: pkh, derivation path and the ledger signer type in one write.
    fn save_ledger_config(&self, pkh: &str, bip_path: &str) -> Result<(), StorageError>;

    /// `(pkh, bip_path)` of the ledger setup, both empty when unset.
    fn ledger_config(&self) -> Result<(String, String), StorageError>;

    /// Sets the manual pause flag.
    fn set_paused(&self, paused: bool) -> Result<(), StorageError>;

    /// Whether the operator paused the daemon.
    fn is_paused(&self) -> Result<bool, StorageError>;

    /// Everything above in one value.
    fn identity(&self) -> Result<DelegateIdentity, StorageError> {
        let (secret_key_ref, pkh) = self.delegate()?;
        let (_, bip_path) = self.ledger_config()?;
        Ok(DelegateIdentity {
            pkh,
            secret_key_ref,
            signer_type: self.signer_type()?,
            bip_path: (!bip_path.is_empty()).then_some(bip_path),
        })
    }
}

/// Chain RPC endpoints the daemon may use.
pub trait EndpointRegistry: Send + Sync {
    /// Adds `url`; `None` when it is already registered.
    fn add_endpoint(&self, url: &str) -> Result<Option<u64>, StorageError>;

    /// All endpoints by id.
    fn list_endpoints(&self) -> Result<BTreeMap<u64, String>, StorageError>;

    /// Removes the endpoint with `id`.
    fn delete_endpoint(&self, id: u64) -> Result<(), StorageError>;

    /// Seeds the network's defaults unless endpoints were ever added.
    /// Returns how many were added.
    fn add_default_endpoints(&self, network: Network) -> Result<usize, StorageError>;
}

/// Persisted notifier configuration blobs.
pub trait NotifierConfigStore: Send + Sync {
    /// Raw configuration of the notifier called `name`.
    fn notifier_config(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replaces the configuration of the notifier called `name`.
    fn save_notifier_config(&self, name: &str, config: &[u8]) -> Result<(), StorageError>;
}

/// Storage contract of the payout subsystem. Values are opaque JSON documents.
pub trait PayoutStore: Send + Sync {
    /// Stores reward metadata for `cycle`, creating its collection.
    fn save_cycle_reward_metadata(&self, cycle: u64, metadata: &str) -> Result<(), StorageError>;

    /// Stores the reward record of `delegator` for `cycle`.
    /// Fails with [`StorageError::MissingBucket`] if the cycle has no metadata yet.
    fn save_delegator_reward(
        &self,
        cycle: u64,
        delegator: &str,
        record: &str,
    ) -> Result<(), StorageError>;

    /// Delegator records of `cycle`, excluding the metadata entry.
    fn cycle_payouts(&self, cycle: u64) -> Result<BTreeMap<String, String>, StorageError>;

    /// Metadata of every cycle with payouts.
    fn payouts_metadata(&self) -> Result<BTreeMap<u64, String>, StorageError>;
}

/// Every repository the daemon needs, backed by one store.
pub trait BakerStore:
    WatermarkStore
    + RightsCache
    + NonceStore
    + DelegateStore
    + EndpointRegistry
    + NotifierConfigStore
    + PayoutStore
{
}

impl<T> BakerStore for T where
    T: WatermarkStore
        + RightsCache
        + NonceStore
        + DelegateStore
        + EndpointRegistry
        + NotifierConfigStore
        + PayoutStore
{
}
