use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle status of a ledger entry.
///
/// The worker owns every transition after `Pending`; values this service does
/// not recognise are kept in `Other` and echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueueJobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Other(String),
}

impl QueueJobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            QueueJobStatus::Pending => "PENDING",
            QueueJobStatus::Running => "RUNNING",
            QueueJobStatus::Completed => "COMPLETED",
            QueueJobStatus::Failed => "FAILED",
            QueueJobStatus::Other(raw) => raw,
        }
    }
}

// Transitions are performed by the worker; these rules describe its contract
// and are only checked from tests here.
#[allow(dead_code)]
impl QueueJobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueJobStatus::Completed | QueueJobStatus::Failed)
    }

    fn rank(&self) -> Option<u8> {
        match self {
            QueueJobStatus::Pending => Some(0),
            QueueJobStatus::Running => Some(1),
            QueueJobStatus::Completed | QueueJobStatus::Failed => Some(2),
            QueueJobStatus::Other(_) => None,
        }
    }

    /// Whether moving from `self` to `next` respects the monotone lifecycle
    /// `PENDING → RUNNING → {COMPLETED | FAILED}`. Unknown statuses never
    /// qualify.
    pub fn can_transition_to(&self, next: &QueueJobStatus) -> bool {
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => !self.is_terminal() && to > from,
            _ => false,
        }
    }
}

impl From<String> for QueueJobStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PENDING" => QueueJobStatus::Pending,
            "RUNNING" => QueueJobStatus::Running,
            "COMPLETED" => QueueJobStatus::Completed,
            "FAILED" => QueueJobStatus::Failed,
            _ => QueueJobStatus::Other(raw),
        }
    }
}

impl From<QueueJobStatus> for String {
    fn from(status: QueueJobStatus) -> Self {
        match status {
            QueueJobStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for QueueJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of asynchronous work, as stored in `queue_jobs`.
///
/// Serialized verbatim as the status snapshot; nothing here is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QueueJobRow {
    pub id: Uuid,
    pub queue: String,
    // Decoded through the blanket `TryFrom<String>` that `From<String>` provides.
    #[sqlx(try_from = "String")]
    pub status: QueueJobStatus,
    pub payload: Value,
    pub result: Option<Value>,
    pub error: Option<Value>,
    pub organization_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

impl QueueJobRow {
    /// A fresh `PENDING` entry with no outcome recorded.
    pub fn pending(
        queue: &str,
        organization_id: Uuid,
        job_id: Uuid,
        payload: Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        QueueJobRow {
            id: Uuid::new_v4(),
            queue: queue.to_string(),
            status: QueueJobStatus::Pending,
            payload,
            result: None,
            error: None,
            organization_id: Some(organization_id),
            job_id: Some(job_id),
            created_at,
            started_at: None,
            completed_at: None,
            failed_at: None,
        }
    }

    /// Tenant check. Rows without an organization predate tenant scoping and
    /// stay visible only while `legacy_unscoped_visible` is set.
    pub fn is_visible_to(&self, organization_id: Uuid, legacy_unscoped_visible: bool) -> bool {
        match self.organization_id {
            Some(owner) => owner == organization_id,
            None => legacy_unscoped_visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> QueueJobRow {
        QueueJobRow::pending(
            "resume-processing",
            Uuid::new_v4(),
            Uuid::new_v4(),
            json!({ "jobId": "j1" }),
            Utc::now(),
        )
    }

    #[test]
    fn test_unknown_status_passes_through() {
        let status: QueueJobStatus = serde_json::from_value(json!("DELAYED")).unwrap();
        assert_eq!(status, QueueJobStatus::Other("DELAYED".to_string()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("DELAYED"));
    }

    #[test]
    fn test_known_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_value(QueueJobStatus::Running).unwrap(),
            json!("RUNNING")
        );
    }

    #[test]
    fn test_lifecycle_is_monotone() {
        use QueueJobStatus::*;
        assert!(Pending.can_transition_to(&Running));
        assert!(Running.can_transition_to(&Completed));
        assert!(Running.can_transition_to(&Failed));
        assert!(!Running.can_transition_to(&Pending));
        assert!(!Completed.can_transition_to(&Failed));
        assert!(!Failed.can_transition_to(&Running));
        assert!(!Pending.can_transition_to(&Other("DELAYED".to_string())));
    }

    #[test]
    fn test_pending_row_has_no_outcome() {
        let row = row();
        assert_eq!(&row.status, &QueueJobStatus::Pending);
        assert!(row.result.is_none());
        assert!(row.error.is_none());
        assert!(row.started_at.is_none());
    }

    #[test]
    fn test_snapshot_uses_camel_case_and_explicit_nulls() {
        let value = serde_json::to_value(row()).unwrap();
        assert_eq!(value["status"], "PENDING");
        assert!(value["result"].is_null());
        assert!(value["error"].is_null());
        assert!(value.get("organizationId").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("failedAt").is_some());
    }

    #[test]
    fn test_visibility_is_tenant_scoped() {
        let row = row();
        let owner = row.organization_id.unwrap();
        assert!(row.is_visible_to(owner, false));
        assert!(!row.is_visible_to(Uuid::new_v4(), true));
    }

    #[test]
    fn test_unscoped_rows_follow_legacy_flag() {
        let mut row = row();
        row.organization_id = None;
        assert!(row.is_visible_to(Uuid::new_v4(), true));
        assert!(!row.is_visible_to(Uuid::new_v4(), false));
    }
}
