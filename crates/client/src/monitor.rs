// Path: crates/client/src/monitor.rs
//! Polls the chain head and feeds new heads to the block event loop.

use baker_api::chain::ChainRpc;
use baker_types::Block;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

/// Emits a [`Block`] every time the head hash changes.
pub struct HeadMonitor {
    rpc: Arc<dyn ChainRpc>,
    interval: Duration,
}

impl HeadMonitor {
    pub fn new(rpc: Arc<dyn ChainRpc>, interval: Duration) -> Self {
        Self { rpc, interval }
    }

    /// Runs until `shutdown` flips to `true` or the receiver is dropped.
    pub async fn run(self, tx: mpsc::Sender<Block>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_hash: Option<String> = None;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!(target: "monitor", "head monitor stopping");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let head = match self.rpc.head().await {
                        Ok(head) => head,
                        Err(e) => {
                            tracing::warn!(target: "monitor", error = %e, "failed to fetch head");
                            continue;
                        }
                    };
                    if last_hash.as_deref() == Some(head.hash.as_str()) {
                        continue;
                    }
                    tracing::debug!(target: "monitor", level = head.level, hash = %head.hash, "new head");
                    last_hash = Some(head.hash.clone());
                    if tx.send(head).await.is_err() {
                        tracing::info!(target: "monitor", "block receiver closed");
                        break;
                    }
                }
            }
        }
    }
}
