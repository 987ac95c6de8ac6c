use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("missing or invalid credentials")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("created {created} of {requested} records before the store failed")]
    PartialWrite {
        created: usize,
        requested: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            ApiError::Validation(reason) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "validation_failed",
                reason.clone(),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "unauthorized",
                "missing or invalid credentials".to_string(),
            ),
            // Uniform body whether the record is missing or owned by someone
            // else; callers must not be able to probe other users' ids.
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "not_found",
                "not found".to_string(),
            ),
            ApiError::PartialWrite {
                created,
                requested,
                source,
            } => {
                tracing::error!(
                    created,
                    requested,
                    "batch insert failed partway: {}",
                    source
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "partial_write",
                    format!(
                        "created {} of {} records before the store failed",
                        created, requested
                    ),
                )
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
