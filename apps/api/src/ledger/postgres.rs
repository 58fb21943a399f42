use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::JobLedger;
use crate::errors::AppError;
use crate::models::job::JobPostingRow;
use crate::models::queue_job::QueueJobRow;
use crate::models::user::MemberRow;
use crate::queue::DispatchPolicy;

#[derive(Clone)]
pub struct PgJobLedger {
    pool: PgPool,
}

impl PgJobLedger {
    /// Opens the connection pool backing the ledger.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        info!("PostgreSQL pool established ({max_connections} connections)");
        Ok(Self { pool })
    }
}

#[async_trait]
impl JobLedger for PgJobLedger {
    async fn find_job_posting(
        &self,
        job_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<JobPostingRow>, AppError> {
        Ok(sqlx::query_as::<_, JobPostingRow>(
            "SELECT id, organization_id, title FROM jobs WHERE id = $1 AND organization_id = $2",
        )
        .bind(job_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_queue_job(&self, row: &QueueJobRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO queue_jobs
                (id, queue, status, payload, result, error,
                 organization_id, job_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(row.id)
        .bind(&row.queue)
        .bind(row.status.as_str())
        .bind(&row.payload)
        .bind(&row.result)
        .bind(&row.error)
        .bind(row.organization_id)
        .bind(row.job_id)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_queue_job(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM queue_jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_queue_job(&self, id: Uuid) -> Result<Option<QueueJobRow>, AppError> {
        Ok(sqlx::query_as::<_, QueueJobRow>(
            r#"
            SELECT id, queue, status, payload, result, error, organization_id, job_id,
                   created_at, started_at, completed_at, failed_at
            FROM queue_jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn resume_status_counts(&self, job_id: Uuid) -> Result<Vec<(String, i64)>, AppError> {
        Ok(sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM resumes WHERE job_id = $1 GROUP BY status",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_member(&self, user_id: Uuid) -> Result<Option<MemberRow>, AppError> {
        Ok(sqlx::query_as::<_, MemberRow>(
            "SELECT organization_id, role FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn prune_finished(&self, queue: &str, policy: DispatchPolicy) -> Result<u64, AppError> {
        let mut removed = 0;
        for (status, keep) in [
            ("COMPLETED", policy.keep_completed),
            ("FAILED", policy.keep_failed),
        ] {
            // Newest `keep` finished rows survive; everything older goes.
            let result = sqlx::query(
                r#"
                DELETE FROM queue_jobs
                WHERE id IN (
                    SELECT id FROM queue_jobs
                    WHERE queue = $1 AND status = $2
                    ORDER BY COALESCE(completed_at, failed_at, created_at) DESC
                    OFFSET $3
                )
                "#,
            )
            .bind(queue)
            .bind(status)
            .bind(i64::from(keep))
            .execute(&self.pool)
            .await?;
            removed += result.rows_affected();
        }
        Ok(removed)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL connection pool closed");
    }
}
