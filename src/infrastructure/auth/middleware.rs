use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{auth::JwtManager, user::Caller},
    error::AppError,
};

pub const X_GUEST_ID: &str = "x-guest-id";

/// Extract the bearer token, if any. A malformed header is an error, a missing one is not.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(auth_header) = headers.get("authorization") else {
        return Ok(None);
    };

    let auth_header = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    // Check Bearer token format
    auth_header
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization format".to_string()))
}

/// Resolve the caller for routes open to guests.
///
/// A valid bearer token yields an authenticated caller; an invalid one is
/// rejected rather than downgraded to a guest. Without a token the caller is a
/// guest identified by `X-Guest-Id`, issued here when missing or unparsable
/// and echoed back on the response.
pub async fn optional_auth_middleware(
    State(jwt_manager): State<Arc<JwtManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = bearer_token(request.headers())? {
        let caller = jwt_manager.caller_from_token(token)?;
        request.extensions_mut().insert(caller);
        return Ok(next.run(request).await);
    }

    let guest_id = request
        .headers()
        .get(X_GUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .unwrap_or_else(|| {
            let issued = Uuid::new_v4();
            tracing::debug!(guest_id = %issued, "Issued guest id");
            issued
        });

    request.extensions_mut().insert(Caller::guest(guest_id));
    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&guest_id.to_string()) {
        response.headers_mut().insert(X_GUEST_ID, header_value);
    }

    Ok(response)
}

/// Admin-only routes: a valid token with the admin role is required
pub async fn require_admin_middleware(
    State(jwt_manager): State<Arc<JwtManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let caller = jwt_manager.caller_from_token(token)?;
    if !caller.is_admin() {
        tracing::warn!(user_id = ?caller.user_id, "Non-admin caller rejected from admin route");
        return Err(AppError::Forbidden("Administrator access required".to_string()));
    }

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
