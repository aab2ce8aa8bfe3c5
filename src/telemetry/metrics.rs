//! Metric instrument factories for rebound.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without an OTLP endpoint the global provider is a no-op and recording
//! costs next to nothing.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("rebound")
}

/// Counter: jobs enqueued.
/// Labels: `queue`.
pub fn jobs_enqueued() -> Counter<u64> {
    meter()
        .u64_counter("rebound.jobs.enqueued")
        .with_description("Number of jobs enqueued")
        .build()
}

/// Counter: reserve calls.
/// Labels: `queue`, `result` ("leased" | "empty").
pub fn jobs_reserved() -> Counter<u64> {
    meter()
        .u64_counter("rebound.jobs.reserved")
        .with_description("Number of reserve calls by outcome")
        .build()
}

/// Counter: delete calls.
/// Labels: `queue`, `result` ("removed" | "absent").
pub fn jobs_deleted() -> Counter<u64> {
    meter()
        .u64_counter("rebound.jobs.deleted")
        .with_description("Number of delete calls by outcome")
        .build()
}

/// Counter: store failures surfaced to callers.
/// Labels: `operation`.
pub fn store_errors() -> Counter<u64> {
    meter()
        .u64_counter("rebound.store.errors")
        .with_description("Number of storage failures")
        .build()
}

/// Histogram: operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("rebound.operation.duration_ms")
        .with_description("Queue operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
