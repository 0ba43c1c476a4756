// Path: crates/client/src/metrics/mod.rs
use baker_telemetry::sinks::{NopSink, RpcMetricsSink};
use once_cell::sync::OnceCell;

static NOP_SINK: NopSink = NopSink;
pub static SINK: OnceCell<&'static dyn RpcMetricsSink> = OnceCell::new();

pub fn metrics() -> &'static dyn RpcMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}
