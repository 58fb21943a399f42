use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A posted role. Read-only here; used to check that a job belongs to the
/// caller's organization before any work is accepted or counted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobPostingRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
}
