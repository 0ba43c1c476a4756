// Path: crates/api/src/lib.rs

//! # Baker API Crate Lints
//!
//! Panics are disallowed in non-test code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
#![deny(missing_docs)]
//! # Baker API
//!
//! The stable contract between the orchestration loop and everything it
//! talks to: typed repositories over the persistent store, the chain RPC,
//! the signer backends, notifiers and the payout subsystem.

/// The chain RPC contract.
pub mod chain;
/// Re-exports the core error types from `baker-types`.
pub mod error;
/// Per-block work-scope and its cancellation signal.
pub mod lifecycle;
/// Notification sinks.
pub mod notify;
/// The payout subsystem hook.
pub mod payout;
/// Signing backends.
pub mod signer;
/// Typed repositories over the persistent store.
pub mod storage;

/// A curated set of the most commonly used traits and types.
pub mod prelude {
    pub use crate::chain::{ChainRpc, DelegateStatus};
    pub use crate::error::{BakerError, ErrorCode};
    pub use crate::lifecycle::WorkScope;
    pub use crate::notify::Notifier;
    pub use crate::payout::PayoutHandler;
    pub use crate::signer::{Signer, SigningDomain};
    pub use crate::storage::{
        BakerStore, DelegateStore, EndpointRegistry, NonceStore, NotifierConfigStore,
        PayoutStore, RightsCache, StorageError, WatermarkStore,
    };
}
