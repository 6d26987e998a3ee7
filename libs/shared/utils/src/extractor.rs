use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

/// Header carrying the verified caller id, set by the identity gateway.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Optional header carrying the caller's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

// Identity is verified upstream; this only lifts it into request extensions
pub async fn identity_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = user_from_headers(request.headers())?;
    debug!("Request identity resolved for user: {}", user.id);

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn user_from_headers(headers: &HeaderMap) -> Result<User, AppError> {
    let raw_id = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Auth("Missing caller identity".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid caller identity header".to_string()))?;

    let id = Uuid::parse_str(raw_id.trim())
        .map_err(|_| AppError::Auth("Caller identity must be a UUID".to_string()))?;

    let role = headers
        .get(USER_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    Ok(User { id, role })
}
