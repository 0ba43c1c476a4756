// Path: crates/api/src/lifecycle/mod.rs
//! The work-scope handed to every task dispatched for one block.

use baker_types::Block;
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// A per-block unit of work with its own cancellation signal.
///
/// A fresh scope is created for every accepted head. Cancelling it tells the
/// tasks bound to that head that they have been superseded. Cancellation is
/// cooperative: tasks check it before each suspension point and never after
/// an irreversible submission.
#[derive(Debug, Clone)]
pub struct WorkScope {
    block: Arc<Block>,
    token: CancellationToken,
}

impl WorkScope {
    /// Creates a scope for `block` with an unfired cancellation signal.
    pub fn new(block: Block) -> Self {
        Self {
            block: Arc::new(block),
            token: CancellationToken::new(),
        }
    }

    /// The head this scope is bound to.
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Level of the head this scope is bound to.
    pub fn level(&self) -> u64 {
        self.block.level
    }

    /// Fires the cancellation signal. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the scope has been superseded.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the scope is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
