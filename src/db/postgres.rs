//! PostgreSQL backend via SQLx.
//!
//! `reserve` locks the chosen row with `FOR UPDATE SKIP LOCKED`, so
//! concurrent reservers on the same queue pass over a row that another
//! transaction is leasing rather than queueing behind it.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{JobRow, JobStore};
use crate::error::Result;
use crate::model::{Job, JobId, JobRecord};

/// Postgres-backed job store. Owns the connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to Postgres and create a connection pool.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/postgres").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl JobStore for PgStore {
    async fn insert(&self, record: &JobRecord) -> Result<JobId> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO jobs (queue, priority, visible_at, lease_seconds, body)
             VALUES ($1, $2, $3, $4, $5)
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
        let mut tx = self.pool.begin().await?;

        let row: Option<JobRow> = sqlx::query_as(
            "UPDATE jobs SET visible_at = $1 + lease_seconds
             WHERE id = (
                 SELECT id FROM jobs
                 WHERE queue = $2 AND visible_at <= $1
                 ORDER BY priority DESC, id ASC
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
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
        let rows_affected = sqlx::query("DELETE FROM jobs WHERE queue = $1 AND id = $2")
            .bind(queue)
            .bind(id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Simple health check: run a SELECT 1.
    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
