// Path: crates/validator/src/orchestration/mod.rs
//! The block event loop.
//!
//! One serialized loop consumes chain heads. Each head gets a fresh
//! [`WorkScope`]; the previous scope is cancelled first so superseded tasks
//! stop before their next suspension point. Tasks run on their own and are
//! never awaited by the loop, except for the bounded drain at shutdown.

mod bake;
mod context;
mod endorse;
mod payouts;
pub mod readiness;
mod reveal;
mod rights;
mod status;

pub use context::{BakerServices, Superseded};

use crate::config::BakerSettings;
use crate::metrics::metrics;
use anyhow::Result;
use baker_api::error::{BakerError, ErrorCode};
use baker_api::lifecycle::WorkScope;
use baker_api::storage::StorageError;
use baker_telemetry::time::Timer;
use baker_types::status::{BakerStatus, Readiness};
use baker_types::Block;
use context::TaskContext;
use futures::FutureExt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

/// Turns chain heads into per-block work.
pub struct BlockEventLoop {
    ctx: Arc<TaskContext>,
    board: Arc<watch::Sender<BakerStatus>>,
    active: Option<WorkScope>,
    tasks: JoinSet<()>,
    last_level: Option<u64>,
    prefetch_running: Arc<AtomicBool>,
}

impl BlockEventLoop {
    /// Creates a loop with an empty status board.
    pub fn new(services: BakerServices, settings: BakerSettings) -> Self {
        let (board, _) = watch::channel(BakerStatus::default());
        Self {
            ctx: Arc::new(TaskContext { services, settings }),
            board: Arc::new(board),
            active: None,
            tasks: JoinSet::new(),
            last_level: None,
            prefetch_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A receiver of the status board, refreshed after every head.
    pub fn status(&self) -> watch::Receiver<BakerStatus> {
        self.board.subscribe()
    }

    /// Consumes `blocks` until the stream ends or `shutdown` flips to `true`,
    /// then drains in-flight tasks.
    pub async fn run(mut self, mut blocks: mpsc::Receiver<Block>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(target: "baker", "block event loop started");
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                block = blocks.recv() => match block {
                    Some(block) => {
                        self.on_block(block).await;
                    }
                    None => {
                        tracing::info!(target: "baker", "head stream closed");
                        break;
                    }
                },
            }
        }
        self.shutdown().await;
    }

    /// Processes one head and returns the scope its tasks are bound to.
    pub async fn on_block(&mut self, block: Block) -> WorkScope {
        self.track_level(&block);
        self.reap_finished();

        if let Some(previous) = self.active.take() {
            previous.cancel();
        }
        let scope = WorkScope::new(block);
        self.active = Some(scope.clone());
        let level = scope.level();

        let readiness =
            readiness::evaluate(&*self.ctx.services.store, &*self.ctx.services.rpc).await;
        metrics().set_readiness(readiness.label());

        if readiness.is_ready() {
            self.spawn_task("endorse", level, endorse::handle_endorsement(self.ctx.clone(), scope.clone()));
            self.spawn_task("reveal", level, reveal::reveal_nonces(self.ctx.clone(), scope.clone()));
            self.spawn_task("bake", level, bake::handle_bake(self.ctx.clone(), scope.clone()));
            self.spawn_task("payouts", level, payouts::handle_payouts(self.ctx.clone(), scope.clone()));
        } else {
            tracing::info!(target: "baker", level, ?readiness, "not ready, skipping dispatch");
        }

        self.spawn_refresh(scope.block().clone(), readiness);
        scope
    }

    /// Waits for every dispatched task to finish.
    pub async fn wait_for_tasks(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            log_join_error(joined);
        }
    }

    /// Cancels the active scope and waits, at most the configured grace
    /// period, for in-flight tasks. Stragglers are aborted.
    pub async fn shutdown(mut self) {
        tracing::info!(target: "baker", "block event loop stopping");
        if let Some(scope) = self.active.take() {
            scope.cancel();
        }
        let grace = self.ctx.settings.shutdown_grace;
        if tokio::time::timeout(grace, self.wait_for_tasks()).await.is_err() {
            tracing::warn!(
                target: "baker",
                remaining = self.tasks.len(),
                ?grace,
                "grace period elapsed, aborting in-flight tasks"
            );
            self.tasks.shutdown().await;
        }
        tracing::info!(target: "baker", "block event loop stopped");
    }

    fn track_level(&mut self, block: &Block) {
        if let Some(last) = self.last_level {
            if block.level <= last {
                tracing::warn!(target: "baker", previous = last, level = block.level, hash = %block.hash, "head did not advance, chain reorganisation");
                metrics().inc_reorgs();
            } else if block.level > last.saturating_add(1) {
                tracing::warn!(target: "baker", previous = last, level = block.level, missed = block.level - last - 1, "levels skipped between heads");
                metrics().inc_level_gaps();
            }
        }
        self.last_level = Some(block.level);
        metrics().set_head_level(block.level);
    }

    fn reap_finished(&mut self) {
        while let Some(Some(joined)) = self.tasks.join_next().now_or_never() {
            log_join_error(joined);
        }
    }

    /// Prefetches rights, unless a prefetch is still running, then rebuilds
    /// the status board.
    fn spawn_refresh(&mut self, head: Block, readiness: Readiness) {
        let ctx = self.ctx.clone();
        let board = self.board.clone();
        let running = self.prefetch_running.clone();
        let level = head.level;
        self.spawn_task("refresh", level, async move {
            if !running.swap(true, Ordering::SeqCst) {
                let result = rights::prefetch_rights(ctx.clone(), head.clone()).await;
                running.store(false, Ordering::SeqCst);
                if let Err(e) = result {
                    metrics().inc_task_errors("prefetch");
                    tracing::warn!(target: "rights", level, error = %format!("{e:#}"), "rights prefetch failed");
                }
            }
            status::refresh_status(&*ctx.services.store, &head, readiness, &board)
        });
    }

    fn spawn_task<F>(&mut self, task: &'static str, level: u64, fut: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        metrics().inc_tasks_dispatched(task);
        let notifications = self.ctx.services.notifications.clone();
        self.tasks.spawn(async move {
            let _timer = Timer::new(metrics(), task);
            match fut.await {
                Ok(()) => {}
                Err(e) if e.is::<Superseded>() => {
                    metrics().inc_tasks_cancelled(task);
                    tracing::debug!(target: "baker", task, level, "task superseded by a newer head");
                }
                Err(e) => {
                    metrics().inc_task_errors(task);
                    if let Some(code) = error_code(&e) {
                        baker_telemetry::error_metrics().inc_error(task, code);
                    }
                    tracing::error!(target: "baker", task, level, error = %format!("{e:#}"), "task failed");
                    notifications
                        .send(&format!("Task {task} failed at level {level}: {e:#}"))
                        .await;
                }
            }
        });
    }
}

/// The stable code of the first typed error in the chain, if any.
fn error_code(e: &anyhow::Error) -> Option<&'static str> {
    e.chain().find_map(|cause| {
        cause
            .downcast_ref::<BakerError>()
            .map(ErrorCode::code)
            .or_else(|| cause.downcast_ref::<StorageError>().map(ErrorCode::code))
    })
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!(target: "baker", error = %e, "task panicked");
        }
    }
}
