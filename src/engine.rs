//! Queue engine: enqueue, reserve and delete on top of a [`JobStore`].
//!
//! The engine holds no job state of its own. Each call validates input,
//! reads the clock once, and performs a single store operation. Lease
//! expiry is never pushed: a lapsed lease simply makes the job eligible
//! again the next time someone reserves from its queue.

use std::sync::Arc;
use std::time::{Duration, Instant};

use opentelemetry::KeyValue;
use tracing::{Instrument, debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::db::JobStore;
use crate::error::{Error, Result};
use crate::model::duration::round_secs;
use crate::model::{Job, JobId, JobRecord, NewJob};
use crate::telemetry::metrics;
use crate::telemetry::queue::{record_job_id, start_operation_span};

/// Longest accepted queue name, in bytes.
pub const MAX_QUEUE_NAME_LEN: usize = 255;

/// Longest lease a job may hold: one year. Keeps `now + lease` far from
/// `i64` overflow in every backend.
pub const MAX_TTR: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Engine policy knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Lease granted when a job is enqueued without a positive TTR.
    pub default_ttr: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_ttr: Duration::from_secs(120),
        }
    }
}

pub struct Engine<S> {
    store: S,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl<S: JobStore> Engine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Enqueue a job. It becomes eligible once its delay has elapsed.
    pub async fn enqueue(&self, new: NewJob) -> Result<JobId> {
        let span = start_operation_span("enqueue", &new.queue);
        async {
            validate_queue(&new.queue)?;
            let ttr = match new.ttr {
                Some(ttr) if !ttr.is_zero() => ttr,
                _ => self.config.default_ttr,
            };
            if ttr.is_zero() {
                return Err(Error::validation("ttr", "must be positive"));
            }
            if ttr > MAX_TTR {
                return Err(Error::validation(
                    "ttr",
                    format!("longer than {}", humantime::format_duration(MAX_TTR)),
                ));
            }
            // Sub-second leases round up so a granted lease is never empty.
            let lease_seconds = round_secs("ttr", ttr)?.max(1);
            let delay_seconds = round_secs("delay", new.delay)?;

            let now = self.clock.now();
            let visible_at = now
                .checked_add(delay_seconds)
                .ok_or_else(|| Error::validation("delay", "duration out of range"))?;

            let record = JobRecord {
                queue: new.queue,
                priority: new.priority,
                visible_at,
                lease_seconds,
                body: new.body,
            };

            let started = Instant::now();
            let id = self
                .store
                .insert(&record)
                .await
                .inspect_err(|e| store_failed("enqueue", e))?;
            observe("enqueue", started);

            record_job_id(&tracing::Span::current(), id);
            metrics::jobs_enqueued().add(1, &[KeyValue::new("queue", record.queue)]);
            debug!(%id, priority = record.priority, visible_at, lease_seconds, "job enqueued");
            Ok(id)
        }
        .instrument(span)
        .await
    }

    /// Lease the highest-priority eligible job in `queue`.
    ///
    /// `Ok(None)` means nothing is eligible right now; it is not an error.
    pub async fn reserve(&self, queue: &str) -> Result<Option<Job>> {
        let span = start_operation_span("reserve", queue);
        async {
            validate_queue(queue)?;
            let now = self.clock.now();

            let started = Instant::now();
            let job = self
                .store
                .reserve(queue, now)
                .await
                .inspect_err(|e| store_failed("reserve", e))?;
            observe("reserve", started);

            let result = match &job {
                Some(job) => {
                    record_job_id(&tracing::Span::current(), job.id);
                    debug!(id = %job.id, priority = job.priority, "job reserved");
                    "leased"
                }
                None => "empty",
            };
            metrics::jobs_reserved().add(
                1,
                &[
                    KeyValue::new("queue", queue.to_string()),
                    KeyValue::new("result", result),
                ],
            );
            Ok(job)
        }
        .instrument(span)
        .await
    }

    /// Delete job `id` from `queue`.
    ///
    /// Succeeds whether or not the job exists: a consumer whose lease lapsed
    /// may finish late and delete a job someone else already deleted.
    /// Returns whether a record was actually removed.
    pub async fn delete(&self, queue: &str, id: JobId) -> Result<bool> {
        let span = start_operation_span("delete", queue);
        record_job_id(&span, id);
        async {
            validate_queue(queue)?;

            let started = Instant::now();
            let removed = self
                .store
                .delete(queue, id)
                .await
                .inspect_err(|e| store_failed("delete", e))?;
            observe("delete", started);

            metrics::jobs_deleted().add(
                1,
                &[
                    KeyValue::new("queue", queue.to_string()),
                    KeyValue::new("result", if removed { "removed" } else { "absent" }),
                ],
            );
            debug!(removed, "job delete");
            Ok(removed)
        }
        .instrument(span)
        .await
    }

    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await
    }
}

fn validate_queue(queue: &str) -> Result<()> {
    if queue.is_empty() {
        return Err(Error::validation("queue", "must not be empty"));
    }
    if queue.len() > MAX_QUEUE_NAME_LEN {
        return Err(Error::validation(
            "queue",
            format!("longer than {MAX_QUEUE_NAME_LEN} bytes"),
        ));
    }
    if queue.contains('/') {
        return Err(Error::validation("queue", "must not contain '/'"));
    }
    Ok(())
}

fn observe(operation: &'static str, started: Instant) {
    metrics::operation_duration_ms().record(
        started.elapsed().as_secs_f64() * 1000.0,
        &[KeyValue::new("operation", operation)],
    );
}

fn store_failed(operation: &'static str, error: &Error) {
    warn!(%error, operation, "store operation failed");
    metrics::store_errors().add(1, &[KeyValue::new("operation", operation)]);
}
