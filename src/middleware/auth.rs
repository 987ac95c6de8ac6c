use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::errors::ApiError;
use crate::AppState;

/// The authenticated owner, resolved from the bearer token before any
/// handler runs. Handlers trust this id and nothing else about the caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: uuid::Uuid,
}

/// Middleware: validates `Authorization: Bearer <token>` and attaches the
/// resolved [`AuthUser`] to the request. 401 on missing, malformed, expired,
/// or unknown-user tokens.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(ApiError::Unauthorized)?;

    let claims = crate::auth::verify_token(token, &state.config.auth_secret).map_err(|e| {
        tracing::warn!("auth: token rejected: {}", e);
        ApiError::Unauthorized
    })?;

    // The subject must still exist; deleted accounts keep signed tokens.
    let user = state
        .db
        .get_user(claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(AuthUser { id: user.id });
    Ok(next.run(req).await)
}
