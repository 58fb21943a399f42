//! Request authentication: bearer token → verified claims → [`Caller`].

pub mod claims;
pub mod tenant;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::errors::AppError;
use crate::state::AppState;

pub use tenant::{resolve_caller, Caller};

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = extract_bearer(&parts.headers).ok_or(AppError::Unauthorized)?;
        let claims = state.tokens.verify(token).map_err(|e| {
            debug!("Rejected bearer token: {e}");
            AppError::Unauthorized
        })?;
        let caller = resolve_caller(&claims, state.ledger.as_ref()).await?;
        debug!(
            user_id = %caller.user_id,
            organization_id = %caller.organization_id,
            role = %caller.role,
            "Authenticated request"
        );
        Ok(caller)
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers), Some("abc.def"));
    }
}
