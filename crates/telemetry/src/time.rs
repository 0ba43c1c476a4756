// Path: crates/telemetry/src/time.rs
use crate::sinks::BakerMetricsSink;
use std::time::Instant;

/// Reports how long a per-block task ran when dropped.
pub struct Timer<'a> {
    sink: &'a dyn BakerMetricsSink,
    task: &'static str,
    start: Instant,
}

impl<'a> Timer<'a> {
    pub fn new(sink: &'a dyn BakerMetricsSink, task: &'static str) -> Self {
        Self {
            sink,
            task,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.sink
            .observe_task_duration(self.task, self.start.elapsed().as_secs_f64());
    }
}
