//! Job types shared by the engine, the stores and the transport.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Store-assigned job identifier. Assigned in creation order, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(JobId)
    }
}

/// A job as handed to a consumer by a successful reservation.
///
/// Lease internals (`visible_at`, lease duration) stay inside the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub queue: String,
    pub priority: i64,
    pub body: String,
}

/// Parameters for enqueueing a job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub queue: String,
    pub body: String,

    /// Higher values are served first.
    pub priority: i64,

    /// Time before the job becomes eligible for its first reservation.
    pub delay: Duration,

    /// Lease granted on each reservation. `None` or zero means the engine's
    /// configured default.
    pub ttr: Option<Duration>,
}

impl NewJob {
    pub fn new(queue: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            body: body.into(),
            priority: 0,
            delay: Duration::ZERO,
            ttr: None,
        }
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn ttr(mut self, ttr: Duration) -> Self {
        self.ttr = Some(ttr);
        self
    }
}

/// A fully resolved row, ready to be written by a store.
///
/// `visible_at` is a Unix timestamp in seconds. Before the first reservation
/// it marks the end of the visibility delay; once leased, the same column
/// holds the lease expiry. A job is eligible iff `visible_at <= now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub queue: String,
    pub priority: i64,
    pub visible_at: i64,
    pub lease_seconds: i64,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let job = NewJob::new("emails", "hello");
        assert_eq!(job.priority, 0);
        assert_eq!(job.delay, Duration::ZERO);
        assert!(job.ttr.is_none());
    }

    #[test]
    fn job_serializes_with_flat_id() {
        let job = Job {
            id: JobId(7),
            queue: "jobs".into(),
            priority: 10,
            body: "x".into(),
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": 7, "queue": "jobs", "priority": 10, "body": "x"})
        );
    }

    #[test]
    fn job_id_parses_from_path_segment() {
        assert_eq!("42".parse::<JobId>().unwrap(), JobId(42));
        assert!("abc".parse::<JobId>().is_err());
    }
}
