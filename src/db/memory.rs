//! In-process backend.
//!
//! Not durable: everything is lost with the process. One mutex guards all
//! queues, so select-and-lease is trivially atomic. Useful for tests and
//! local experiments (`DATABASE_URL=memory:`).

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use tokio::sync::Mutex;

use super::JobStore;
use crate::error::Result;
use crate::model::{Job, JobId, JobRecord};

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    /// queue -> id -> record. Ids ascend in creation order.
    queues: HashMap<String, BTreeMap<i64, JobRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs across all queues, leased or not.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.queues.values().map(BTreeMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl JobStore for MemoryStore {
    async fn insert(&self, record: &JobRecord) -> Result<JobId> {
        let mut inner = self.inner.lock().await;
        inner.last_id += 1;
        let id = inner.last_id;
        inner
            .queues
            .entry(record.queue.clone())
            .or_default()
            .insert(id, record.clone());
        Ok(JobId(id))
    }

    async fn reserve(&self, queue: &str, now: i64) -> Result<Option<Job>> {
        let mut inner = self.inner.lock().await;
        let Some(jobs) = inner.queues.get_mut(queue) else {
            return Ok(None);
        };

        let best = jobs
            .iter()
            .filter(|(_, r)| r.visible_at <= now)
            .max_by_key(|(id, r)| (r.priority, Reverse(**id)))
            .map(|(id, _)| *id);

        Ok(best.and_then(|id| {
            let record = jobs.get_mut(&id)?;
            record.visible_at = now.saturating_add(record.lease_seconds);
            Some(Job {
                id: JobId(id),
                queue: record.queue.clone(),
                priority: record.priority,
                body: record.body.clone(),
            })
        }))
    }

    async fn delete(&self, queue: &str, id: JobId) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let Some(jobs) = inner.queues.get_mut(queue) else {
            return Ok(false);
        };
        let removed = jobs.remove(&id.0).is_some();
        if jobs.is_empty() {
            inner.queues.remove(queue);
        }
        Ok(removed)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(priority: i64) -> JobRecord {
        JobRecord {
            queue: "q".into(),
            priority,
            visible_at: 0,
            lease_seconds: 10,
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn equal_priorities_are_served_first_in_first_out() {
        let store = MemoryStore::new();
        let a = store.insert(&record(3)).await.unwrap();
        let b = store.insert(&record(3)).await.unwrap();

        assert_eq!(store.reserve("q", 0).await.unwrap().unwrap().id, a);
        assert_eq!(store.reserve("q", 0).await.unwrap().unwrap().id, b);
        assert!(store.reserve("q", 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lease_expiry_saturates_instead_of_wrapping() {
        let store = MemoryStore::new();
        let mut long = record(0);
        long.lease_seconds = i64::MAX;
        let id = store.insert(&long).await.unwrap();

        assert_eq!(store.reserve("q", 10).await.unwrap().unwrap().id, id);
        assert!(store.reserve("q", 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_last_job_drops_the_queue() {
        let store = MemoryStore::new();
        let id = store.insert(&record(0)).await.unwrap();
        assert!(store.delete("q", id).await.unwrap());
        assert!(store.is_empty().await);
        assert!(!store.delete("q", id).await.unwrap());
    }
}
