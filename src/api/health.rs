use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::parse_enum;
use crate::errors::ApiError;
use crate::middleware::auth::AuthUser;
use crate::models::health::{validate_value, HealthRecord, RecordType};
use crate::store::postgres::NewHealthRecord;
use crate::AppState;

// ── Request DTOs ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RecordListQuery {
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateRecordRequest {
    pub record_type: String,
    pub value: Value,
    pub notes: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateRecordRequest {
    pub value: Option<Value>,
    pub notes: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct TrendsQuery {
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub days: Option<i64>,
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /api/v1/health/records — list the caller's records, newest first
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<RecordListQuery>,
) -> Result<Json<Vec<HealthRecord>>, ApiError> {
    let record_type = match params.record_type.as_deref() {
        Some(raw) => Some(parse_enum::<RecordType>(raw, "record type")?),
        None => None,
    };
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);

    let records = state
        .db
        .list_health_records(auth.id, record_type, params.start_date, params.end_date, limit)
        .await?;
    Ok(Json(records))
}

/// POST /api/v1/health/records
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<HealthRecord>), ApiError> {
    let record_type = parse_enum::<RecordType>(&payload.record_type, "record type")?;
    validate_value(record_type, &payload.value).map_err(ApiError::Validation)?;

    let record = state
        .db
        .insert_health_record(&NewHealthRecord {
            user_id: auth.id,
            record_type,
            value: payload.value,
            notes: payload.notes,
            recorded_at: payload.recorded_at.unwrap_or_else(Utc::now),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/health/records/:id
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<HealthRecord>, ApiError> {
    let record = state
        .db
        .get_health_record(id, auth.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(record))
}

/// PUT /api/v1/health/records/:id
pub async fn update_record(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRecordRequest>,
) -> Result<Json<HealthRecord>, ApiError> {
    // A changed value must still fit the record's declared type.
    if let Some(ref value) = payload.value {
        let existing = state
            .db
            .get_health_record(id, auth.id)
            .await?
            .ok_or(ApiError::NotFound)?;
        validate_value(existing.record_type, value).map_err(ApiError::Validation)?;
    }

    let record = state
        .db
        .update_health_record(
            id,
            auth.id,
            payload.value.as_ref(),
            payload.notes.as_deref(),
            payload.recorded_at,
        )
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(record))
}

/// DELETE /api/v1/health/records/:id
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !state.db.delete_health_record(id, auth.id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "deleted": true })))
}

/// GET /api/v1/health/summary — latest reading and 7-day count per type,
/// plus BMI from the profile
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .db
        .get_user(auth.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let week_ago = Utc::now() - Duration::days(7);
    let latest = state.db.latest_records_per_type(auth.id).await?;
    let counts = state.db.record_counts_since(auth.id, week_ago).await?;
    let total = state.db.count_health_records(auth.id).await?;

    let mut per_type = serde_json::Map::new();
    for record_type in RecordType::ALL {
        let name = record_type.as_str();
        let latest_entry = latest
            .iter()
            .find(|r| r.record_type == record_type)
            .map(|r| serde_json::to_value(r))
            .transpose()
            .map_err(|e| ApiError::Internal(e.into()))?;
        let week_count = counts
            .iter()
            .find(|(t, _)| t == name)
            .map(|(_, c)| *c)
            .unwrap_or(0);
        per_type.insert(
            name.to_string(),
            json!({
                "latest": latest_entry,
                "count_last_7_days": week_count,
            }),
        );
    }

    Ok(Json(json!({
        "user_profile": user.profile(),
        "bmi": user.bmi(),
        "health_records_summary": per_type,
        "total_records": total,
    })))
}

/// GET /api/v1/health/trends — time series for one record type
pub async fn trends(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<TrendsQuery>,
) -> Result<Json<Value>, ApiError> {
    let record_type = match params.record_type.as_deref() {
        Some(raw) => parse_enum::<RecordType>(raw, "record type")?,
        None => RecordType::Weight,
    };
    let days = params.days.unwrap_or(30).clamp(1, 365);
    let since = Utc::now() - Duration::days(days);

    let records = state
        .db
        .records_of_type_since(auth.id, record_type, since)
        .await?;

    let points: Vec<Value> = records
        .iter()
        .map(|r| {
            json!({
                "date": r.recorded_at,
                "value": r.value,
                "notes": r.notes,
            })
        })
        .collect();

    Ok(Json(json!({
        "record_type": record_type,
        "period_days": days,
        "trends": points,
    })))
}
