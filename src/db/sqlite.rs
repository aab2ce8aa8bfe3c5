//! SQLite backend via SQLx.
//!
//! SQLite serialises writers, so the single `UPDATE ... RETURNING`
//! statement behind `reserve` is linearizable without row locks. WAL mode
//! lets readers proceed while a write is in flight; `busy_timeout` makes
//! contending writers wait instead of failing.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use super::{JobRow, JobStore};
use crate::error::Result;
use crate::model::{Job, JobId, JobRecord};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed job store. Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url`.
    ///
    /// In-memory databases are pinned to a single long-lived connection so
    /// the data survives between calls.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        }
        .connect_with(options)
        .await?;

        Ok(Self { pool })
    }

    /// Create a migrated in-memory database (for testing).
    pub async fn in_memory() -> Result<Self> {
        let store = Self::connect("sqlite::memory:", 1).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/sqlite").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl JobStore for SqliteStore {
    async fn insert(&self, record: &JobRecord) -> Result<JobId> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO jobs (queue, priority, visible_at, lease_seconds, body)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id",
        )
        .bind(&record.queue)
        .bind(record.priority)
        .bind(record.visible_at)
        .bind(record.lease_seconds)
        .bind(&record.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(JobId(id))
    }

    async fn reserve(&self, queue: &str, now: i64) -> Result<Option<Job>> {
        // Select and lease in one statement, inside one transaction: if the
        // caller drops this future before commit, the lease rolls back.
        let mut tx = self.pool.begin().await?;

        let row: Option<JobRow> = sqlx::query_as(
            "UPDATE jobs SET visible_at = ?1 + lease_seconds
             WHERE id = (
                 SELECT id FROM jobs
                 WHERE queue = ?2 AND visible_at <= ?1
                 ORDER BY priority DESC, id ASC
                 LIMIT 1
             )
             RETURNING id, queue, priority, body",
        )
        .bind(now)
        .bind(queue)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.map(Job::from))
    }

    async fn delete(&self, queue: &str, id: JobId) -> Result<bool> {
        let rows_affected = sqlx::query("DELETE FROM jobs WHERE queue = ?1 AND id = ?2")
            .bind(queue)
            .bind(id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(queue: &str, priority: i64, visible_at: i64) -> JobRecord {
        JobRecord {
            queue: queue.to_string(),
            priority,
            visible_at,
            lease_seconds: 30,
            body: format!("p{priority}"),
        }
    }

    #[tokio::test]
    async fn reserve_moves_visible_at_to_lease_expiry() {
        let store = SqliteStore::in_memory().await.unwrap();
        let id = store.insert(&record("q", 1, 100)).await.unwrap();

        let job = store.reserve("q", 100).await.unwrap().unwrap();
        assert_eq!(job.id, id);

        let visible_at: i64 = sqlx::query_scalar("SELECT visible_at FROM jobs WHERE id = ?1")
            .bind(id.0)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(visible_at, 130);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = SqliteStore::in_memory().await.unwrap();
        let first = store.insert(&record("q", 0, 0)).await.unwrap();
        assert!(store.delete("q", first).await.unwrap());

        let second = store.insert(&record("q", 0, 0)).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn delete_is_scoped_to_queue() {
        let store = SqliteStore::in_memory().await.unwrap();
        let id = store.insert(&record("a", 0, 0)).await.unwrap();

        assert!(!store.delete("b", id).await.unwrap());
        assert!(store.reserve("a", 0).await.unwrap().is_some());
    }
}
