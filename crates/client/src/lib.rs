// Path: crates/client/src/lib.rs
//! # Baker Client Crate Lints
//!
//! Panics are disallowed in non-test code to promote robust error handling.
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

//! # Baker Client
//!
//! Thin HTTP adapters behind the collaborator traits of `baker-api`: a
//! Tezos-style node RPC client with endpoint failover, the head monitor that
//! feeds the block event loop, a remote signer client and a webhook notifier.
//! Also hosts the base58check and watermark encoding shared by the tasks.

pub mod encoding;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod rpc;
pub mod signer;
pub mod webhook;

pub use error::ClientError;
pub use monitor::HeadMonitor;
pub use rpc::HttpChainClient;
pub use signer::RemoteSigner;
pub use webhook::WebhookNotifier;
