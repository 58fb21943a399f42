//! Persistent job ledger: the one seam between handlers and the store.
//!
//! `AppState` holds an `Arc<dyn JobLedger>`; production uses
//! [`postgres::PgJobLedger`].

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::JobPostingRow;
use crate::models::queue_job::QueueJobRow;
use crate::models::user::MemberRow;
use crate::queue::DispatchPolicy;

#[async_trait]
pub trait JobLedger: Send + Sync {
    /// The job posting, only if it belongs to `organization_id`.
    async fn find_job_posting(
        &self,
        job_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<JobPostingRow>, AppError>;

    async fn insert_queue_job(&self, row: &QueueJobRow) -> Result<(), AppError>;

    /// Removes a row whose dispatch never happened.
    async fn delete_queue_job(&self, id: Uuid) -> Result<(), AppError>;

    async fn find_queue_job(&self, id: Uuid) -> Result<Option<QueueJobRow>, AppError>;

    /// `(status, count)` for every resume status present on the job.
    async fn resume_status_counts(&self, job_id: Uuid) -> Result<Vec<(String, i64)>, AppError>;

    async fn find_member(&self, user_id: Uuid) -> Result<Option<MemberRow>, AppError>;

    /// Deletes finished rows of `queue` beyond the retention caps.
    /// Returns the number of rows removed.
    async fn prune_finished(&self, queue: &str, policy: DispatchPolicy) -> Result<u64, AppError>;

    async fn close(&self) {}
}
