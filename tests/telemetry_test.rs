//! Integration tests for telemetry initialization and span helpers.

use rebound::model::JobId;
use rebound::telemetry::{TelemetryConfig, init_telemetry, metrics, queue};

#[test]
fn telemetry_initializes_without_endpoint() {
    // The global subscriber can only be set once per process; a second
    // init in the same binary returns Err, which is acceptable here.
    let config = TelemetryConfig {
        endpoint: None,
        service_name: "rebound-test".to_string(),
        log_level: "debug".to_string(),
    };
    if let Ok(guard) = init_telemetry(config) {
        assert!(!guard.is_exporting());
    }
}

#[test]
fn invalid_log_level_is_rejected() {
    let config = TelemetryConfig {
        endpoint: None,
        service_name: "rebound-test".to_string(),
        log_level: "rebound=verbose".to_string(),
    };
    // RUST_LOG takes precedence when set; only assert when it is not.
    if std::env::var("RUST_LOG").is_err() {
        assert!(init_telemetry(config).is_err());
    }
}

#[test]
fn operation_span_records_job_id() {
    let span = queue::start_operation_span("reserve", "jobs");
    queue::record_job_id(&span, JobId(7));
}

#[test]
fn metric_instruments_build_without_provider() {
    metrics::jobs_enqueued().add(1, &[]);
    metrics::operation_duration_ms().record(1.5, &[]);
}
