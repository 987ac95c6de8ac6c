use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;

use crate::errors::ApiError;
use crate::AppState;

pub mod auth;
pub mod goals;
pub mod health;
pub mod notifications;

/// Build the API router.
/// All routes are relative — the caller mounts this under `/api/v1`.
pub fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected = Router::new()
        .route(
            "/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/auth/change-password", post(auth::change_password))
        .route(
            "/health/records",
            get(health::list_records).post(health::create_record),
        )
        .route(
            "/health/records/:id",
            get(health::get_record)
                .put(health::update_record)
                .delete(health::delete_record),
        )
        .route("/health/summary", get(health::summary))
        .route("/health/trends", get(health::trends))
        .route("/goals", get(goals::list_goals).post(goals::create_goal))
        .route("/goals/suggestions", get(goals::suggestions))
        .route(
            "/goals/:id",
            get(goals::get_goal)
                .put(goals::update_goal)
                .delete(goals::delete_goal),
        )
        .route("/goals/:id/progress", post(goals::update_progress))
        .route(
            "/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route("/notifications/due", get(notifications::fetch_due))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/reminders", post(notifications::create_reminder))
        .route(
            "/notifications/medication-reminders",
            post(notifications::create_medication_reminders),
        )
        .route(
            "/notifications/motivational",
            post(notifications::send_motivational),
        )
        .route(
            "/notifications/:id",
            get(notifications::get_notification).delete(notifications::delete_notification),
        )
        .route("/notifications/:id/read", post(notifications::mark_read))
        .route(
            "/notifications/:id/dismiss",
            post(notifications::dismiss),
        )
        .layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Parse a client-supplied enum value (notification kind, record type, …)
/// out of its wire string, turning mismatches into a 400 with the offending
/// value named.
pub(crate) fn parse_enum<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| ApiError::Validation(format!("invalid {}: '{}'", what, raw)))
}

/// Reject empty or whitespace-only required strings.
pub(crate) fn require_field<'a>(value: &'a str, name: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{} is required", name)));
    }
    Ok(trimmed)
}
