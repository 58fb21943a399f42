use tracing::debug;
use uuid::Uuid;

use super::claims::JwtClaims;
use crate::errors::AppError;
use crate::ledger::JobLedger;

const DEFAULT_ROLE: &str = "member";

/// The resolved identity of an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: String,
}

/// Resolves the caller's tenant with a fixed precedence:
///
/// 1. `org_id` embedded in the token; the directory is not consulted.
/// 2. the user's organization in the directory.
///
/// A caller with neither is unauthenticated.
pub async fn resolve_caller(claims: &JwtClaims, ledger: &dyn JobLedger) -> Result<Caller, AppError> {
    if let Some(organization_id) = claims.org_id {
        return Ok(Caller {
            user_id: claims.sub,
            organization_id,
            role: claims.role.clone().unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        });
    }

    let member = ledger.find_member(claims.sub).await?;
    match member {
        Some(member) => {
            let organization_id = member.organization_id.ok_or(AppError::Unauthorized)?;
            debug!(user_id = %claims.sub, %organization_id, "Tenant resolved from directory");
            Ok(Caller {
                user_id: claims.sub,
                organization_id,
                role: claims.role.clone().unwrap_or(member.role),
            })
        }
        None => Err(AppError::Unauthorized),
    }
}
