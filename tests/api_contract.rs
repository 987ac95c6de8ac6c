//! Integration tests for the API error contract and credential issuance.
//!
//! These tests verify:
//! 1. Error taxonomy maps to the documented HTTP status codes
//! 2. The not-found response is uniform: it never distinguishes a missing
//!    record from another user's record
//! 3. Bearer tokens round-trip, expire, and reject a wrong secret

use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use healthd::errors::ApiError;

async fn response_parts(err: ApiError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

mod error_mapping {
    use super::*;

    #[tokio::test]
    async fn test_validation_maps_to_400() {
        let (status, body) =
            response_parts(ApiError::Validation("title is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_failed");
        assert_eq!(body["error"]["message"], "title is required");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_401() {
        let (status, body) = response_parts(ApiError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["type"], "authentication_error");
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let (status, body) = response_parts(ApiError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_not_found_body_is_uniform() {
        // Whether the id never existed or belongs to someone else, the
        // response is byte-identical. Existence must not leak.
        let (_, missing) = response_parts(ApiError::NotFound).await;
        let (_, not_owned) = response_parts(ApiError::NotFound).await;
        assert_eq!(missing, not_owned);
        assert_eq!(missing["error"]["message"], "not found");
    }

    #[tokio::test]
    async fn test_database_error_maps_to_500_with_masked_message() {
        let (status, body) = response_parts(ApiError::Database(sqlx::Error::PoolTimedOut)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        // Internal detail stays in the logs, not the response.
        assert_eq!(body["error"]["message"], "internal server error");
    }

    #[tokio::test]
    async fn test_partial_write_reports_progress() {
        let (status, body) = response_parts(ApiError::PartialWrite {
            created: 17,
            requested: 62,
            source: sqlx::Error::PoolTimedOut,
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "partial_write");
        assert_eq!(
            body["error"]["message"],
            "created 17 of 62 records before the store failed"
        );
    }
}

mod credentials {
    use super::*;
    use healthd::auth;

    const SECRET: &str = "contract-test-secret";

    #[test]
    fn test_issued_token_identifies_the_user() {
        let user_id = Uuid::new_v4();
        let token = auth::issue_token(user_id, SECRET, 7).unwrap();
        let claims = auth::verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = auth::issue_token(Uuid::new_v4(), SECRET, -1).unwrap();
        assert!(auth::verify_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = auth::issue_token(Uuid::new_v4(), "another-secret", 7).unwrap();
        assert!(auth::verify_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let token = auth::issue_token(Uuid::new_v4(), SECRET, 7).unwrap();
        let tampered = format!("{}x", token);
        assert!(auth::verify_token(&tampered, SECRET).is_err());
    }
}
