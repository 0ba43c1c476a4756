// Path: crates/telemetry/src/lib.rs
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

//! # Baker Telemetry
//!
//! Observability for the baker daemon: structured logging initialisation, a
//! Prometheus metrics backend, abstract sinks that keep instrumentation
//! independent of that backend, and the HTTP server for `/metrics`,
//! `/healthz`, `/readyz` and `/status`.

/// A lightweight HTTP server for metrics, health, readiness and status.
pub mod http;
/// The initialization routine for global structured logging.
pub mod init;
/// The concrete implementation of metrics sinks using the `prometheus` crate.
pub mod prometheus;
/// Abstract traits (`*MetricsSink`) that define the contract for metrics reporting.
pub mod sinks;
/// A simple RAII timer for measuring the duration of a scope.
pub mod time;

// Re-export the accessor for the global error sink.
pub use sinks::error_metrics;
