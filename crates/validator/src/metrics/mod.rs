// Path: crates/validator/src/metrics/mod.rs
//! Static accessor for the orchestration metrics sink.
//!
//! Set once by the binary after the Prometheus backend is installed. Tests
//! and tools that never set it record into a no-op sink.

use baker_telemetry::sinks::{BakerMetricsSink, NopSink};
use once_cell::sync::OnceCell;

static NOP_SINK: NopSink = NopSink;
/// A lazily-initialized static reference to the orchestration metrics sink.
pub static SINK: OnceCell<&'static dyn BakerMetricsSink> = OnceCell::new();

/// Returns the configured sink, or a no-op sink.
pub fn metrics() -> &'static dyn BakerMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}
