// Path: crates/types/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]
#![deny(missing_docs)]

//! # Baker Types
//!
//! Plain data shared by every crate of the baker daemon: chain heads, rights,
//! seed nonces, delegate identity, watermark records, configuration and the
//! error taxonomy.

/// Chain head notifications.
pub mod block;
/// Daemon configuration and per-network constants.
pub mod config;
/// Core error types.
pub mod error;
/// Delegate identity and signer selection.
pub mod identity;
/// Seed nonce records.
pub mod nonce;
/// Baking and endorsing rights.
pub mod rights;
/// Watermark, seal and submission-intent records.
pub mod seal;
/// Derived status snapshot published by the daemon.
pub mod status;

pub use block::{Block, BlockMetadata};
pub use identity::{DelegateIdentity, SignerType};
pub use nonce::Nonce;
pub use rights::{NextRight, RightEntry};
pub use seal::{GateDecision, OperationKind, SealOutcome, SealRecord, SubmissionIntent};
