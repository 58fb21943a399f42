use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::JobLedger;
use crate::errors::AppError;
use crate::models::job::JobPostingRow;
use crate::models::queue_job::{QueueJobRow, QueueJobStatus};
use crate::models::user::MemberRow;
use crate::queue::DispatchPolicy;

/// In-process ledger for tests.
#[derive(Default)]
pub struct MemoryJobLedger {
    queue_jobs: Mutex<HashMap<Uuid, QueueJobRow>>,
    postings: Mutex<Vec<JobPostingRow>>,
    resumes: Mutex<Vec<(Uuid, String)>>,
    members: Mutex<HashMap<Uuid, MemberRow>>,
}

impl MemoryJobLedger {
    pub fn with_posting(self, job_id: Uuid, organization_id: Uuid) -> Self {
        self.postings.lock().unwrap().push(JobPostingRow {
            id: job_id,
            organization_id,
            title: "Backend Engineer".to_string(),
        });
        self
    }

    pub fn with_resumes(self, job_id: Uuid, status: &str, count: usize) -> Self {
        let mut resumes = self.resumes.lock().unwrap();
        resumes.extend(std::iter::repeat((job_id, status.to_string())).take(count));
        drop(resumes);
        self
    }

    pub fn with_member(self, user_id: Uuid, organization_id: Option<Uuid>, role: &str) -> Self {
        self.members.lock().unwrap().insert(
            user_id,
            MemberRow {
                organization_id,
                role: role.to_string(),
            },
        );
        self
    }

    pub fn put(&self, row: QueueJobRow) {
        self.queue_jobs.lock().unwrap().insert(row.id, row);
    }

    pub fn queue_job_count(&self) -> usize {
        self.queue_jobs.lock().unwrap().len()
    }
}

#[async_trait]
impl JobLedger for MemoryJobLedger {
    async fn find_job_posting(
        &self,
        job_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<JobPostingRow>, AppError> {
        Ok(self
            .postings
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == job_id && p.organization_id == organization_id)
            .cloned())
    }

    async fn insert_queue_job(&self, row: &QueueJobRow) -> Result<(), AppError> {
        self.put(row.clone());
        Ok(())
    }

    async fn delete_queue_job(&self, id: Uuid) -> Result<(), AppError> {
        self.queue_jobs.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn find_queue_job(&self, id: Uuid) -> Result<Option<QueueJobRow>, AppError> {
        Ok(self.queue_jobs.lock().unwrap().get(&id).cloned())
    }

    async fn resume_status_counts(&self, job_id: Uuid) -> Result<Vec<(String, i64)>, AppError> {
        let mut counts: HashMap<String, i64> = HashMap::new();
        for (owner, status) in self.resumes.lock().unwrap().iter() {
            if *owner == job_id {
                *counts.entry(status.clone()).or_default() += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }

    async fn find_member(&self, user_id: Uuid) -> Result<Option<MemberRow>, AppError> {
        Ok(self.members.lock().unwrap().get(&user_id).cloned())
    }

    async fn prune_finished(&self, queue: &str, policy: DispatchPolicy) -> Result<u64, AppError> {
        let mut rows = self.queue_jobs.lock().unwrap();
        let mut removed = 0;
        for (status, keep) in [
            (QueueJobStatus::Completed, policy.keep_completed),
            (QueueJobStatus::Failed, policy.keep_failed),
        ] {
            let mut finished: Vec<_> = rows
                .values()
                .filter(|r| r.queue == queue && r.status == status)
                .map(|r| {
                    let at = r.completed_at.or(r.failed_at).unwrap_or(r.created_at);
                    (at, r.id)
                })
                .collect();
            finished.sort_by(|a, b| b.cmp(a));
            for (_, id) in finished.into_iter().skip(keep as usize) {
                rows.remove(&id);
                removed += 1;
            }
        }
        Ok(removed)
    }
}
