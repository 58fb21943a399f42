//! Work submission: ledger row first, queue dispatch second, and no row left
//! behind when the dispatch fails.

use chrono::{SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::ledger::JobLedger;
use crate::models::job::JobPostingRow;
use crate::models::queue_job::QueueJobRow;
use crate::queue::{QueueMessage, WorkQueue};

/// A resume file (or archive of resumes) already written to object storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUpload {
    pub key: String,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub archive: bool,
    /// Resume entries found inside an archive.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<String>,
}

/// Immutable input captured on the ledger row and sent to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResumesPayload {
    pub job_id: Uuid,
    pub organization_id: Uuid,
    pub submitted_by: Option<Uuid>,
    /// Empty means "process the resumes already attached to the job".
    #[serde(default)]
    pub uploads: Vec<StoredUpload>,
    pub options: Value,
}

#[derive(Debug, Clone)]
pub struct SubmitWork {
    pub job_id: Uuid,
    pub organization_id: Uuid,
    pub submitted_by: Option<Uuid>,
    pub options: Option<Value>,
}

/// Normalises submission options: absent or `null` becomes `{}`, anything
/// other than an object is rejected.
pub fn normalize_options(options: Option<Value>) -> Result<Value, AppError> {
    match options {
        None | Some(Value::Null) => Ok(Value::Object(Map::new())),
        Some(Value::Object(map)) => Ok(Value::Object(map)),
        Some(_) => Err(AppError::invalid_field("options", "must be a JSON object")),
    }
}

/// The job posting, provided it belongs to the organization.
pub async fn ensure_job_posting(
    ledger: &dyn JobLedger,
    job_id: Uuid,
    organization_id: Uuid,
) -> Result<JobPostingRow, AppError> {
    ledger
        .find_job_posting(job_id, organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// Validates the request, checks the job belongs to the tenant and dispatches.
pub async fn submit_work(
    ledger: &dyn JobLedger,
    queue: &dyn WorkQueue,
    config: &Config,
    request: SubmitWork,
) -> Result<QueueJobRow, AppError> {
    let options = normalize_options(request.options)?;
    let posting = ensure_job_posting(ledger, request.job_id, request.organization_id).await?;

    let payload = ProcessResumesPayload {
        job_id: posting.id,
        organization_id: posting.organization_id,
        submitted_by: request.submitted_by,
        uploads: Vec::new(),
        options,
    };
    dispatch(ledger, queue, config, payload).await
}

/// Creates the `PENDING` ledger row and hands it to the queue. The caller has
/// already checked tenant ownership of `payload.job_id`.
pub async fn dispatch(
    ledger: &dyn JobLedger,
    queue: &dyn WorkQueue,
    config: &Config,
    payload: ProcessResumesPayload,
) -> Result<QueueJobRow, AppError> {
    let data = serde_json::to_value(&payload).map_err(|e| AppError::Internal(e.into()))?;
    let row = QueueJobRow::pending(
        &config.queue_name,
        payload.organization_id,
        payload.job_id,
        data.clone(),
        // TIMESTAMPTZ keeps microseconds; the 202 body must match later reads.
        Utc::now().trunc_subsecs(6),
    );

    ledger.insert_queue_job(&row).await?;

    let message = QueueMessage::new(row.id, &config.queue_name, data, config.dispatch);
    if let Err(e) = queue.enqueue(&message).await {
        if let Err(cleanup) = ledger.delete_queue_job(row.id).await {
            error!(
                queue_job_id = %row.id,
                "Dispatch failed and the ledger row could not be removed; needs reconciliation: {cleanup}"
            );
        }
        return Err(e.into());
    }

    info!(
        queue_job_id = %row.id,
        job_id = %payload.job_id,
        organization_id = %payload.organization_id,
        uploads = payload.uploads.len(),
        "Queued resume processing"
    );
    Ok(row)
}
