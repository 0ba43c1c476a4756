// Path: crates/storage/src/lib.rs
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

//! Persistent storage for the baker daemon.
//!
//! A single redb database holds every collection. Nested collections are
//! realised with prefix-encoded keys (`parent` then `/` then the child key),
//! integer keys are big-endian so iteration order is numeric order, and the
//! per-collection sequence counters live in their own `sequences` table.

pub mod metrics;
pub mod redb_baker_store;

pub use redb_baker_store::RedbBakerStore;
