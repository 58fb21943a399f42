use uuid::Uuid;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::ledger::JobLedger;
use crate::models::queue_job::QueueJobRow;

/// Current snapshot of a ledger entry as seen by `caller`.
///
/// Missing, malformed and cross-tenant ids all produce the same `NotFound`,
/// so callers cannot probe for entries owned by other organizations.
pub async fn queue_job_status(
    ledger: &dyn JobLedger,
    caller: &Caller,
    queue_job_id: Option<&str>,
    legacy_unscoped_visible: bool,
) -> Result<QueueJobRow, AppError> {
    let raw = queue_job_id.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(AppError::invalid_field("queueJobId", "is required"));
    }

    let not_found = || AppError::NotFound(format!("Queue job {raw} not found"));

    let Ok(id) = Uuid::parse_str(raw) else {
        return Err(not_found());
    };

    ledger
        .find_queue_job(id)
        .await?
        .filter(|row| row.is_visible_to(caller.organization_id, legacy_unscoped_visible))
        .ok_or_else(not_found)
}
