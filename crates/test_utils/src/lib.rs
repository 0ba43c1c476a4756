// Path: crates/test_utils/src/lib.rs
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

//! # Baker Test Utilities
//!
//! In-memory stand-ins for the chain node, signer and notifiers, block and
//! store fixtures, and a few assertion helpers shared by the test suites.

pub mod assertions;
pub mod fakes;
pub mod fixtures;
pub mod randomness;
