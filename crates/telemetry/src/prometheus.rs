// Path: crates/telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_gauge, register_gauge_vec, register_histogram_vec,
    register_int_counter, register_int_counter_vec, Gauge, GaugeVec, HistogramVec, IntCounter,
    IntCounterVec,
};

// --- Metric Statics ---
// Collectors are initialized exactly once by `install`.

static HEAD_LEVEL: OnceCell<Gauge> = OnceCell::new();
static READINESS_STATE: OnceCell<GaugeVec> = OnceCell::new();
static WATERMARK_LEVEL: OnceCell<GaugeVec> = OnceCell::new();
static LEVEL_GAPS_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static REORGS_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static NONCES_SAVED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static SEALS_RECORDED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static SEAL_CONFLICTS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static BACKWARD_SEALS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static RIGHTS_SAVED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static TASKS_DISPATCHED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static TASKS_CANCELLED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static TASK_ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static TASK_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static GATE_REFUSALS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static INJECTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static NOTIFICATIONS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static RPC_REQUESTS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static RPC_REQUEST_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

const READINESS_STATES: [&str; 6] = [
    "starting",
    "ready",
    "no_delegate",
    "paused",
    "not_registered",
    "unreachable",
];

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

/// Runs `$body` with the collector if `install()` has been called; records
/// nothing otherwise.
macro_rules! with_metric {
    ($metric:ident, |$m:ident| $body:expr) => {
        if let Some($m) = $metric.get() {
            $body;
        }
    };
}

impl StorageMetricsSink for PrometheusSink {
    fn inc_seals_recorded(&self, kind: &str) {
        with_metric!(SEALS_RECORDED_TOTAL, |m| m.with_label_values(&[kind]).inc());
    }
    fn inc_seal_conflicts(&self, kind: &str) {
        with_metric!(SEAL_CONFLICTS_TOTAL, |m| m.with_label_values(&[kind]).inc());
    }
    fn inc_backward_seals(&self, kind: &str) {
        with_metric!(BACKWARD_SEALS_TOTAL, |m| m.with_label_values(&[kind]).inc());
    }
    fn set_watermark(&self, kind: &str, level: u64) {
        with_metric!(WATERMARK_LEVEL, |m| m
            .with_label_values(&[kind])
            .set(level as f64));
    }
    fn inc_rights_saved(&self, kind: &str, count: u64) {
        with_metric!(RIGHTS_SAVED_TOTAL, |m| m
            .with_label_values(&[kind])
            .inc_by(count));
    }
    fn inc_nonces_saved(&self) {
        with_metric!(NONCES_SAVED_TOTAL, |m| m.inc());
    }
}

impl BakerMetricsSink for PrometheusSink {
    fn set_head_level(&self, level: u64) {
        with_metric!(HEAD_LEVEL, |m| m.set(level as f64));
    }
    fn inc_level_gaps(&self) {
        with_metric!(LEVEL_GAPS_TOTAL, |m| m.inc());
    }
    fn inc_reorgs(&self) {
        with_metric!(REORGS_TOTAL, |m| m.inc());
    }
    fn set_readiness(&self, state: &str) {
        with_metric!(READINESS_STATE, |m| {
            for s in READINESS_STATES {
                m.with_label_values(&[s])
                    .set(if s == state { 1.0 } else { 0.0 });
            }
        });
    }
    fn inc_tasks_dispatched(&self, task: &'static str) {
        with_metric!(TASKS_DISPATCHED_TOTAL, |m| m.with_label_values(&[task]).inc());
    }
    fn inc_tasks_cancelled(&self, task: &'static str) {
        with_metric!(TASKS_CANCELLED_TOTAL, |m| m.with_label_values(&[task]).inc());
    }
    fn inc_task_errors(&self, task: &'static str) {
        with_metric!(TASK_ERRORS_TOTAL, |m| m.with_label_values(&[task]).inc());
    }
    fn observe_task_duration(&self, task: &'static str, duration_secs: f64) {
        with_metric!(TASK_DURATION_SECONDS, |m| m
            .with_label_values(&[task])
            .observe(duration_secs));
    }
    fn inc_gate_refusals(&self, kind: &str, reason: &'static str) {
        with_metric!(GATE_REFUSALS_TOTAL, |m| m
            .with_label_values(&[kind, reason])
            .inc());
    }
    fn inc_injected(&self, kind: &'static str) {
        with_metric!(INJECTED_TOTAL, |m| m.with_label_values(&[kind]).inc());
    }
    fn inc_notifications(&self, notifier: &str, outcome: &'static str) {
        with_metric!(NOTIFICATIONS_TOTAL, |m| m
            .with_label_values(&[notifier, outcome])
            .inc());
    }
}

impl RpcMetricsSink for PrometheusSink {
    fn observe_request_duration(&self, route: &str, duration_secs: f64) {
        with_metric!(RPC_REQUEST_DURATION_SECONDS, |m| m
            .with_label_values(&[route])
            .observe(duration_secs));
    }
    fn inc_requests_total(&self, route: &str, status_code: u16) {
        with_metric!(RPC_REQUESTS_TOTAL, |m| m
            .with_label_values(&[route, &status_code.to_string()])
            .inc());
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, variant: &'static str) {
        with_metric!(ERRORS_TOTAL, |m| m.with_label_values(&[kind, variant]).inc());
    }
}

fn already_initialized<T>(_: T) -> prometheus::Error {
    prometheus::Error::Msg("static already initialized".into())
}

/// Initializes all Prometheus metrics collectors and returns a static reference to the sink.
/// This function must be called only once at application startup.
pub fn install() -> Result<&'static PrometheusSink, prometheus::Error> {
    HEAD_LEVEL
        .set(register_gauge!(
            "baker_head_level",
            "Level of the last processed chain head."
        )?)
        .map_err(already_initialized)?;
    READINESS_STATE
        .set(register_gauge_vec!(
            "baker_readiness_state",
            "Current readiness state (1 if active, 0 otherwise).",
            &["state"]
        )?)
        .map_err(already_initialized)?;
    WATERMARK_LEVEL
        .set(register_gauge_vec!(
            "baker_watermark_level",
            "Highest sealed level per operation kind.",
            &["kind"]
        )?)
        .map_err(already_initialized)?;
    LEVEL_GAPS_TOTAL
        .set(register_int_counter!(
            "baker_level_gaps_total",
            "Heads that skipped one or more levels."
        )?)
        .map_err(already_initialized)?;
    REORGS_TOTAL
        .set(register_int_counter!(
            "baker_reorgs_total",
            "Heads at or below the previously processed level."
        )?)
        .map_err(already_initialized)?;
    NONCES_SAVED_TOTAL
        .set(register_int_counter!(
            "baker_nonces_saved_total",
            "Seed nonces persisted for later revelation."
        )?)
        .map_err(already_initialized)?;
    SEALS_RECORDED_TOTAL
        .set(register_int_counter_vec!(
            "baker_seals_recorded_total",
            "Seals that advanced a watermark.",
            &["kind"]
        )?)
        .map_err(already_initialized)?;
    SEAL_CONFLICTS_TOTAL
        .set(register_int_counter_vec!(
            "baker_seal_conflicts_total",
            "Seals refused because a different hash was already sealed at the level.",
            &["kind"]
        )?)
        .map_err(already_initialized)?;
    BACKWARD_SEALS_TOTAL
        .set(register_int_counter_vec!(
            "baker_backward_seals_total",
            "Seals at or below the watermark that were ignored.",
            &["kind"]
        )?)
        .map_err(already_initialized)?;
    RIGHTS_SAVED_TOTAL
        .set(register_int_counter_vec!(
            "baker_rights_saved_total",
            "Rights entries written to the cache.",
            &["kind"]
        )?)
        .map_err(already_initialized)?;
    TASKS_DISPATCHED_TOTAL
        .set(register_int_counter_vec!(
            "baker_tasks_dispatched_total",
            "Per-block tasks dispatched.",
            &["task"]
        )?)
        .map_err(already_initialized)?;
    TASKS_CANCELLED_TOTAL
        .set(register_int_counter_vec!(
            "baker_tasks_cancelled_total",
            "Per-block tasks that stopped because their head was superseded.",
            &["task"]
        )?)
        .map_err(already_initialized)?;
    TASK_ERRORS_TOTAL
        .set(register_int_counter_vec!(
            "baker_task_errors_total",
            "Per-block tasks that failed.",
            &["task"]
        )?)
        .map_err(already_initialized)?;
    TASK_DURATION_SECONDS
        .set(register_histogram_vec!(
            "baker_task_duration_seconds",
            "Wall time of per-block tasks.",
            &["task"],
            exponential_buckets(0.005, 2.0, 15)?
        )?)
        .map_err(already_initialized)?;
    GATE_REFUSALS_TOTAL
        .set(register_int_counter_vec!(
            "baker_gate_refusals_total",
            "Attempts refused by the watermark gate.",
            &["kind", "reason"]
        )?)
        .map_err(already_initialized)?;
    INJECTED_TOTAL
        .set(register_int_counter_vec!(
            "baker_injected_total",
            "Signed artifacts injected into the network.",
            &["kind"]
        )?)
        .map_err(already_initialized)?;
    NOTIFICATIONS_TOTAL
        .set(register_int_counter_vec!(
            "baker_notifications_total",
            "Notification deliveries.",
            &["notifier", "outcome"]
        )?)
        .map_err(already_initialized)?;
    RPC_REQUESTS_TOTAL
        .set(register_int_counter_vec!(
            "baker_rpc_requests_total",
            "Outbound chain RPC requests.",
            &["route", "status"]
        )?)
        .map_err(already_initialized)?;
    RPC_REQUEST_DURATION_SECONDS
        .set(register_histogram_vec!(
            "baker_rpc_request_duration_seconds",
            "Latency of outbound chain RPC requests.",
            &["route"],
            exponential_buckets(0.001, 2.0, 15)?
        )?)
        .map_err(already_initialized)?;
    ERRORS_TOTAL
        .set(register_int_counter_vec!(
            "baker_errors_total",
            "Total number of errors, categorized by type and variant.",
            &["kind", "variant"]
        )?)
        .map_err(already_initialized)?;

    static SINK: PrometheusSink = PrometheusSink;
    Ok(&SINK)
}
