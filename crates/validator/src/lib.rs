// Path: crates/validator/src/lib.rs
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

//! # Baker Validator
//!
//! The block-driven core of the daemon. [`BlockEventLoop`] consumes chain
//! heads, evaluates the readiness gate and dispatches the per-block tasks
//! (endorse, bake, reveal nonces, payouts) plus the rights prefetch and the
//! status refresh. Every irreversible submission goes through the watermark
//! gate of the store.

/// Notification fan-out and signer routing shared by the tasks.
pub mod common;
/// Runtime settings derived from the daemon configuration.
pub mod config;
/// Static access to the orchestration metrics sink.
pub mod metrics;
/// The block event loop and its tasks.
pub mod orchestration;

pub use common::{NotificationService, SignerRouter};
pub use config::BakerSettings;
pub use orchestration::{BakerServices, BlockEventLoop};
