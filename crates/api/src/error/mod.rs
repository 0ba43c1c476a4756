// Path: crates/api/src/error/mod.rs
//! Re-exports all core error types from the central `baker-types` crate.

pub use baker_types::error::*;
pub use crate::storage::StorageError;
