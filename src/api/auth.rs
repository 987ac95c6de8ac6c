use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{parse_enum, require_field};
use crate::errors::ApiError;
use crate::middleware::auth::AuthUser;
use crate::models::user::{ActivityLevel, User, UserProfile};
use crate::store::postgres::{NewUser, ProfileChanges};
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<String>,
    pub medical_conditions: Option<Value>,
    pub emergency_contact: Option<Value>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<String>,
    pub medical_conditions: Option<Value>,
    pub emergency_contact: Option<Value>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ── Handlers ─────────────────────────────────────────────────

/// POST /api/v1/auth/register — create an account and issue a token
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let username = require_field(&payload.username, "username")?.to_string();
    let email = require_field(&payload.email, "email")?.to_string();
    require_field(&payload.password, "password")?;

    if state.db.username_in_use(&username, None).await? {
        return Err(ApiError::Validation("username already exists".into()));
    }
    if state.db.email_in_use(&email, None).await? {
        return Err(ApiError::Validation("email already exists".into()));
    }

    let activity_level = match payload.activity_level.as_deref() {
        Some(raw) => parse_enum(raw, "activity_level")?,
        None => ActivityLevel::Moderate,
    };

    let password_hash = crate::auth::hash_password(&payload.password)?;
    let user = state
        .db
        .insert_user(&NewUser {
            username,
            email,
            password_hash,
            age: payload.age,
            gender: payload.gender,
            height_cm: payload.height_cm,
            weight_kg: payload.weight_kg,
            activity_level,
            medical_conditions: payload.medical_conditions.unwrap_or_else(|| Value::Array(vec![])),
            emergency_contact: payload
                .emergency_contact
                .unwrap_or_else(|| Value::Object(Default::default())),
        })
        .await?;

    let token = crate::auth::issue_token(
        user.id,
        &state.config.auth_secret,
        state.config.token_ttl_days,
    )?;

    tracing::info!(user_id = %user.id, "registered new user");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.profile(),
        }),
    ))
}

/// POST /api/v1/auth/login — verify credentials and issue a token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    require_field(&payload.username, "username")?;
    require_field(&payload.password, "password")?;

    // One failure path for unknown user and bad password.
    let user = state
        .db
        .get_user_by_username(payload.username.trim())
        .await?
        .filter(|u| crate::auth::verify_password(&payload.password, &u.password_hash))
        .ok_or(ApiError::Unauthorized)?;

    let token = crate::auth::issue_token(
        user.id,
        &state.config.auth_secret,
        state.config.token_ttl_days,
    )?;

    Ok(Json(AuthResponse {
        token,
        user: user.profile(),
    }))
}

/// GET /api/v1/auth/profile — full profile of the caller
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .db
        .get_user(auth.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(user))
}

/// PUT /api/v1/auth/profile — partial profile update
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    if let Some(ref username) = payload.username {
        require_field(username, "username")?;
        if state.db.username_in_use(username.trim(), Some(auth.id)).await? {
            return Err(ApiError::Validation("username already exists".into()));
        }
    }
    if let Some(ref email) = payload.email {
        require_field(email, "email")?;
        if state.db.email_in_use(email.trim(), Some(auth.id)).await? {
            return Err(ApiError::Validation("email already exists".into()));
        }
    }

    let activity_level = match payload.activity_level.as_deref() {
        Some(raw) => Some(parse_enum(raw, "activity_level")?),
        None => None,
    };

    let changes = ProfileChanges {
        username: payload.username.map(|u| u.trim().to_string()),
        email: payload.email.map(|e| e.trim().to_string()),
        age: payload.age,
        gender: payload.gender,
        height_cm: payload.height_cm,
        weight_kg: payload.weight_kg,
        activity_level,
        medical_conditions: payload.medical_conditions,
        emergency_contact: payload.emergency_contact,
    };

    let user = state
        .db
        .update_user_profile(auth.id, &changes)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(user))
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_field(&payload.current_password, "current_password")?;
    require_field(&payload.new_password, "new_password")?;

    let user = state
        .db
        .get_user(auth.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !crate::auth::verify_password(&payload.current_password, &user.password_hash) {
        return Err(ApiError::Validation("current password is incorrect".into()));
    }

    let new_hash = crate::auth::hash_password(&payload.new_password)?;
    state.db.update_password(auth.id, &new_hash).await?;

    Ok(Json(serde_json::json!({ "changed": true })))
}
