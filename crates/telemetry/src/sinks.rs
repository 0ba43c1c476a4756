// Path: crates/telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling core logic from the backend.

use once_cell::sync::OnceCell;

// --- Static Sink Access ---

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global error metrics sink.
pub static SINK: OnceCell<&'static dyn ErrorMetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns the configured error metrics sink, or a no-op sink.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

// --- Trait Definitions ---

/// A sink for metrics related to the persistent store.
pub trait StorageMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the counter of seals that advanced a watermark.
    fn inc_seals_recorded(&self, kind: &str);
    /// Increments the counter of seals refused because a different hash was already sealed.
    fn inc_seal_conflicts(&self, kind: &str);
    /// Increments the counter of ignored seals at or below the watermark.
    fn inc_backward_seals(&self, kind: &str);
    /// Sets the watermark gauge for `kind`.
    fn set_watermark(&self, kind: &str, level: u64);
    /// Increments the counter of rights entries written.
    fn inc_rights_saved(&self, kind: &str, count: u64);
    /// Increments the counter of nonces written.
    fn inc_nonces_saved(&self);
}
impl StorageMetricsSink for NopSink {
    fn inc_seals_recorded(&self, _kind: &str) {}
    fn inc_seal_conflicts(&self, _kind: &str) {}
    fn inc_backward_seals(&self, _kind: &str) {}
    fn set_watermark(&self, _kind: &str, _level: u64) {}
    fn inc_rights_saved(&self, _kind: &str, _count: u64) {}
    fn inc_nonces_saved(&self) {}
}

/// A sink for metrics related to the block event loop and its tasks.
pub trait BakerMetricsSink: Send + Sync + std::fmt::Debug {
    /// Sets the gauge for the last processed head level.
    fn set_head_level(&self, level: u64);
    /// Increments the counter of heads that skipped levels.
    fn inc_level_gaps(&self);
    /// Increments the counter of heads at or below the previous one.
    fn inc_reorgs(&self);
    /// Sets a gauge vector to indicate the current readiness state.
    fn set_readiness(&self, state: &str);
    /// Increments the counter of dispatched tasks, labeled by task.
    fn inc_tasks_dispatched(&self, task: &'static str);
    /// Increments the counter of tasks that observed cancellation.
    fn inc_tasks_cancelled(&self, task: &'static str);
    /// Increments the counter of failed tasks.
    fn inc_task_errors(&self, task: &'static str);
    /// Observes the duration of one task run.
    fn observe_task_duration(&self, task: &'static str, duration_secs: f64);
    /// Increments the counter of attempts refused by the watermark gate.
    fn inc_gate_refusals(&self, kind: &str, reason: &'static str);
    /// Increments the counter of artifacts injected, labeled by kind.
    fn inc_injected(&self, kind: &'static str);
    /// Increments the counter of notification deliveries, labeled by notifier and outcome.
    fn inc_notifications(&self, notifier: &str, outcome: &'static str);
}
impl BakerMetricsSink for NopSink {
    fn set_head_level(&self, _level: u64) {}
    fn inc_level_gaps(&self) {}
    fn inc_reorgs(&self) {}
    fn set_readiness(&self, _state: &str) {}
    fn inc_tasks_dispatched(&self, _task: &'static str) {}
    fn inc_tasks_cancelled(&self, _task: &'static str) {}
    fn inc_task_errors(&self, _task: &'static str) {}
    fn observe_task_duration(&self, _task: &'static str, _duration_secs: f64) {}
    fn inc_gate_refusals(&self, _kind: &str, _reason: &'static str) {}
    fn inc_injected(&self, _kind: &'static str) {}
    fn inc_notifications(&self, _notifier: &str, _outcome: &'static str) {}
}

/// A sink for metrics related to outbound chain RPC calls.
pub trait RpcMetricsSink: Send + Sync + std::fmt::Debug {
    /// Observes the latency of an RPC request, labeled by route.
    fn observe_request_duration(&self, route: &str, duration_secs: f64);
    /// Increments a counter for total RPC requests, labeled by route and status code.
    fn inc_requests_total(&self, route: &str, status_code: u16);
}
impl RpcMetricsSink for NopSink {
    fn observe_request_duration(&self, _route: &str, _duration_secs: f64) {}
    fn inc_requests_total(&self, _route: &str, _status_code: u16) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and variant.
    fn inc_error(&self, kind: &'static str, variant: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _variant: &'static str) {}
}

