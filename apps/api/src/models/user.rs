use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Directory view of a user, used when a token carries no organization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MemberRow {
    pub organization_id: Option<Uuid>,
    pub role: String,
}
