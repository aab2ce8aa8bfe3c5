//! Job record store: the trait the engine is written against, plus the
//! backends that implement it.
//!
//! Every backend provides the same capability set: insert a record, the
//! atomic select-and-lease primitive behind `reserve`, and delete-by-key.

pub mod memory;
pub mod postgres;
pub mod sqlite;

use std::future::Future;

use crate::error::{Error, Result};
use crate::model::{Job, JobId, JobRecord};

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use sqlite::SqliteStore;

/// Durable storage of job records.
///
/// Implementations must make [`JobStore::reserve`] linearizable: two
/// concurrent calls on the same queue never lease the same record unless
/// the first lease has already lapsed.
pub trait JobStore: Send + Sync {
    /// Insert a new record. Returns its id, assigned in creation order.
    fn insert(&self, record: &JobRecord) -> impl Future<Output = Result<JobId>> + Send;

    /// Atomically pick the best eligible job in `queue` and lease it.
    ///
    /// Eligible means `visible_at <= now`. The best job has the highest
    /// priority; ties go to the lowest id (first enqueued). The chosen
    /// record gets `visible_at = now + lease_seconds`, which hides it until
    /// the lease lapses and re-exposes it afterwards. Returns `None` when
    /// nothing is eligible.
    fn reserve(&self, queue: &str, now: i64) -> impl Future<Output = Result<Option<Job>>> + Send;

    /// Delete the job `(queue, id)`. Returns whether a record was removed;
    /// a missing record is not an error.
    fn delete(&self, queue: &str, id: JobId) -> impl Future<Output = Result<bool>> + Send;

    /// Check that the backend is reachable.
    fn health_check(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Backend chosen at runtime from a database URL.
#[derive(Debug)]
pub enum Db {
    Sqlite(SqliteStore),
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl Db {
    /// Connect to the backend named by the URL scheme:
    /// `sqlite:`, `postgres:`/`postgresql:`, or `memory:`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "sqlite" => Ok(Self::Sqlite(SqliteStore::connect(url, max_connections).await?)),
            "postgres" | "postgresql" => {
                Ok(Self::Postgres(PgStore::connect(url, max_connections).await?))
            }
            "memory" => Ok(Self::Memory(MemoryStore::new())),
            other => Err(Error::Config(format!(
                "unsupported database url scheme {other:?}"
            ))),
        }
    }

    /// Run all pending migrations for the selected backend.
    pub async fn migrate(&self) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.migrate().await,
            Self::Postgres(store) => store.migrate().await,
            Self::Memory(_) => Ok(()),
        }
    }

    /// Short backend name for logs.
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }
}

impl JobStore for Db {
    async fn insert(&self, record: &JobRecord) -> Result<JobId> {
        match self {
            Self::Sqlite(store) => store.insert(record).await,
            Self::Postgres(store) => store.insert(record).await,
            Self::Memory(store) => store.insert(record).await,
        }
    }

    async fn reserve(&self, queue: &str, now: i64) -> Result<Option<Job>> {
        match self {
            Self::Sqlite(store) => store.reserve(queue, now).await,
            Self::Postgres(store) => store.reserve(queue, now).await,
            Self::Memory(store) => store.reserve(queue, now).await,
        }
    }

    async fn delete(&self, queue: &str, id: JobId) -> Result<bool> {
        match self {
            Self::Sqlite(store) => store.delete(queue, id).await,
            Self::Postgres(store) => store.delete(queue, id).await,
            Self::Memory(store) => store.delete(queue, id).await,
        }
    }

    async fn health_check(&self) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.health_check().await,
            Self::Postgres(store) => store.health_check().await,
            Self::Memory(store) => store.health_check().await,
        }
    }
}

/// Row returned by the SQL backends' reserve statement.
#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    queue: String,
    priority: i64,
    body: String,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Self {
            id: JobId(row.id),
            queue: row.queue,
            priority: row.priority,
            body: row.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_selects_backend_from_scheme() {
        let db = Db::connect("memory:", 1).await.unwrap();
        assert_eq!(db.backend(), "memory");

        let db = Db::connect("sqlite::memory:", 1).await.unwrap();
        assert_eq!(db.backend(), "sqlite");
    }

    #[tokio::test]
    async fn connect_rejects_unknown_scheme() {
        let err = Db::connect("redis://localhost", 1).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
