use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ledger::JobLedger;
use crate::models::resume::ResumeStatus;
use crate::processing::submitter::ensure_job_posting;

/// Per-job resume processing counts.
///
/// `pending` is `max(0, total - completed)`: everything not yet completed,
/// so it overlaps `failed` and `in_progress`. Whether failed and in-flight
/// resumes should be excluded is an open product question; keep the formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingSummary {
    pub total: i64,
    pub completed: i64,
    pub failed: i64,
    pub in_progress: i64,
    pub pending: i64,
    pub counts: BTreeMap<String, i64>,
}

/// Folds `(status, count)` groups into a summary. Repeated statuses are summed.
pub fn summarize<I>(groups: I) -> ProcessingSummary
where
    I: IntoIterator<Item = (String, i64)>,
{
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for (status, count) in groups {
        *counts.entry(status).or_default() += count.max(0);
    }

    let mut summary = ProcessingSummary {
        total: 0,
        completed: 0,
        failed: 0,
        in_progress: 0,
        pending: 0,
        counts: BTreeMap::new(),
    };

    for (status, &count) in &counts {
        summary.total += count;
        match ResumeStatus::from(status.as_str()) {
            ResumeStatus::Completed => summary.completed += count,
            ResumeStatus::Failed => summary.failed += count,
            s if s.is_in_flight() => summary.in_progress += count,
            _ => {}
        }
    }

    summary.pending = (summary.total - summary.completed).max(0);
    summary.counts = counts;
    summary
}

pub async fn processing_summary(
    ledger: &dyn JobLedger,
    job_id: Uuid,
    organization_id: Uuid,
) -> Result<ProcessingSummary, AppError> {
    ensure_job_posting(ledger, job_id, organization_id).await?;
    let groups = ledger.resume_status_counts(job_id).await?;
    Ok(summarize(groups))
}
