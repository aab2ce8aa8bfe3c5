//! Span helpers for queue operations.

use tracing::Span;

use crate::model::JobId;

/// Start a span for one engine operation on `queue`.
///
/// `job.id` is declared empty; fill it with [`record_job_id`] once known.
pub fn start_operation_span(operation: &'static str, queue: &str) -> Span {
    tracing::info_span!(
        "queue.operation",
        "queue.operation" = operation,
        "queue.name" = queue,
        "job.id" = tracing::field::Empty,
    )
}

pub fn record_job_id(span: &Span, id: JobId) {
    span.record("job.id", id.0);
}
