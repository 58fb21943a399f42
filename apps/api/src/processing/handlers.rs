//! Axum route handlers for the resume-processing API.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::queue_job::QueueJobRow;
use crate::processing::aggregate::{processing_summary, ProcessingSummary};
use crate::processing::intake::{discard_uploads, store_batch, IncomingFile};
use crate::processing::status::queue_job_status;
use crate::processing::submitter::{
    dispatch, ensure_job_posting, normalize_options, submit_work, ProcessResumesPayload,
    StoredUpload, SubmitWork,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub options: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub queue_job_id: Uuid,
    pub job: QueueJobRow,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uploads: Vec<StoredUpload>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "queueJobId")]
    pub queue_job_id: Option<String>,
}

/// Path ids are opaque to callers; one that is not a UUID names nothing.
fn parse_job_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(format!("Job {raw} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs/:job_id/process
///
/// Queues (re)processing of the resumes already attached to a job.
pub async fn handle_submit(
    State(state): State<AppState>,
    caller: Caller,
    Path(job_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let job_id = parse_job_id(&job_id)?;
    let request: SubmitRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SubmitRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::invalid_field("body", e.to_string()))?
    };

    let row = submit_work(
        state.ledger.as_ref(),
        state.queue.as_ref(),
        &state.config,
        SubmitWork {
            job_id,
            organization_id: caller.organization_id,
            submitted_by: Some(caller.user_id),
            options: request.options,
        },
    )
    .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            queue_job_id: row.id,
            job: row,
            uploads: Vec::new(),
        }),
    ))
}

/// POST /api/v1/jobs/:job_id/resumes
///
/// Multipart upload of resume files and/or zip archives (`file` parts, plus an
/// optional JSON `options` part). Files are stored, then the batch is queued.
pub async fn handle_upload(
    State(state): State<AppState>,
    caller: Caller,
    Path(job_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let job_id = parse_job_id(&job_id)?;
    let posting = ensure_job_posting(state.ledger.as_ref(), job_id, caller.organization_id).await?;

    let mut files = Vec::new();
    let mut options = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" | "files" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::invalid_field("file", "missing file name"))?;
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Failed to read upload: {e}")))?;
                files.push(IncomingFile {
                    file_name,
                    content_type,
                    data,
                });
                if files.len() > state.config.max_batch_files {
                    return Err(AppError::invalid_field(
                        "file",
                        format!("at most {} files per batch", state.config.max_batch_files),
                    ));
                }
            }
            "options" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::invalid_field("options", e.to_string()))?;
                let value = serde_json::from_str(&text)
                    .map_err(|e| AppError::invalid_field("options", e.to_string()))?;
                options = Some(value);
            }
            _ => {}
        }
    }

    let options = normalize_options(options)?;
    let uploads = store_batch(
        state.storage.as_ref(),
        posting.organization_id,
        posting.id,
        files,
        state.config.max_batch_files,
    )
    .await?;

    let payload = ProcessResumesPayload {
        job_id: posting.id,
        organization_id: posting.organization_id,
        submitted_by: Some(caller.user_id),
        uploads: uploads.clone(),
        options,
    };
    let row = match dispatch(state.ledger.as_ref(), state.queue.as_ref(), &state.config, payload).await
    {
        Ok(row) => row,
        Err(e) => {
            discard_uploads(state.storage.as_ref(), &uploads).await;
            return Err(e);
        }
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            queue_job_id: row.id,
            job: row,
            uploads,
        }),
    ))
}

/// GET /api/v1/queue/status?queueJobId=
///
/// Raw ledger snapshot; safe to poll.
pub async fn handle_queue_status(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<StatusQuery>,
) -> Result<Json<QueueJobRow>, AppError> {
    let row = queue_job_status(
        state.ledger.as_ref(),
        &caller,
        query.queue_job_id.as_deref(),
        state.config.legacy_unscoped_visible,
    )
    .await?;
    Ok(Json(row))
}

/// GET /api/v1/jobs/:job_id/processing-status
pub async fn handle_processing_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(job_id): Path<String>,
) -> Result<Json<ProcessingSummary>, AppError> {
    let job_id = parse_job_id(&job_id)?;
    let summary = processing_summary(state.ledger.as_ref(), job_id, caller.organization_id).await?;
    Ok(Json(summary))
}
