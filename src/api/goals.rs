use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{parse_enum, require_field};
use crate::errors::ApiError;
use crate::middleware::auth::AuthUser;
use crate::models::goal::{reaches_target, Goal, GoalStatus, GoalType};
use crate::models::user::ActivityLevel;
use crate::store::postgres::{GoalChanges, NewGoal};
use crate::AppState;

// ── Request DTOs ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GoalListQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub goal_type: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateGoalRequest {
    pub goal_type: String,
    pub title: String,
    pub description: Option<String>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub unit: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub unit: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct ProgressRequest {
    pub current_value: f64,
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /api/v1/goals
pub async fn list_goals(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<GoalListQuery>,
) -> Result<Json<Vec<Goal>>, ApiError> {
    let status = match params.status.as_deref() {
        Some(raw) => Some(parse_enum::<GoalStatus>(raw, "goal status")?),
        None => None,
    };
    let goal_type = match params.goal_type.as_deref() {
        Some(raw) => Some(parse_enum::<GoalType>(raw, "goal type")?),
        None => None,
    };

    let goals = state.db.list_goals(auth.id, status, goal_type).await?;
    Ok(Json(goals))
}

/// POST /api/v1/goals
pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<Goal>), ApiError> {
    let goal_type = parse_enum::<GoalType>(&payload.goal_type, "goal type")?;
    let title = require_field(&payload.title, "title")?.to_string();
    let status = match payload.status.as_deref() {
        Some(raw) => parse_enum::<GoalStatus>(raw, "goal status")?,
        None => GoalStatus::Active,
    };

    let goal = state
        .db
        .insert_goal(&NewGoal {
            user_id: auth.id,
            goal_type,
            title,
            description: payload.description,
            target_value: payload.target_value,
            current_value: payload.current_value.unwrap_or(0.0),
            unit: payload.unit,
            deadline: payload.deadline,
            status,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

/// GET /api/v1/goals/:id
pub async fn get_goal(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Goal>, ApiError> {
    let goal = state
        .db
        .get_goal(id, auth.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(goal))
}

/// PUT /api/v1/goals/:id
pub async fn update_goal(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGoalRequest>,
) -> Result<Json<Goal>, ApiError> {
    let status = match payload.status.as_deref() {
        Some(raw) => Some(parse_enum::<GoalStatus>(raw, "goal status")?),
        None => None,
    };

    let changes = GoalChanges {
        title: payload.title,
        description: payload.description,
        target_value: payload.target_value,
        current_value: payload.current_value,
        unit: payload.unit,
        deadline: payload.deadline,
        status,
    };

    let goal = state
        .db
        .update_goal(id, auth.id, &changes)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(goal))
}

/// DELETE /api/v1/goals/:id
pub async fn delete_goal(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !state.db.delete_goal(id, auth.id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "deleted": true })))
}

/// POST /api/v1/goals/:id/progress — record progress; reaching the target
/// completes the goal
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProgressRequest>,
) -> Result<Json<Goal>, ApiError> {
    let goal = state
        .db
        .get_goal(id, auth.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let status = if reaches_target(goal.target_value, payload.current_value) {
        Some(GoalStatus::Completed)
    } else {
        None
    };

    let changes = GoalChanges {
        current_value: Some(payload.current_value),
        status,
        ..Default::default()
    };

    let goal = state
        .db
        .update_goal(id, auth.id, &changes)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(goal))
}

/// GET /api/v1/goals/suggestions — personalized starting points from the
/// caller's profile
pub async fn suggestions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .db
        .get_user(auth.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let mut suggestions: Vec<Value> = Vec::new();

    if let (Some(height_cm), Some(bmi)) = (user.height_cm, user.bmi()) {
        let height_m = height_cm / 100.0;
        if bmi > 25.0 {
            suggestions.push(json!({
                "goal_type": GoalType::WeightLoss,
                "title": "Lose Weight to Healthy BMI",
                "description": format!(
                    "Your current BMI is {:.1}. Consider losing weight to reach a healthy BMI range (18.5-24.9).",
                    bmi
                ),
                "target_value": (24.9 * height_m * height_m * 10.0).round() / 10.0,
                "unit": "kg",
                "priority": "high",
            }));
        } else if bmi < 18.5 {
            suggestions.push(json!({
                "goal_type": GoalType::WeightGain,
                "title": "Gain Weight to Healthy BMI",
                "description": format!(
                    "Your current BMI is {:.1}. Consider gaining weight to reach a healthy BMI range (18.5-24.9).",
                    bmi
                ),
                "target_value": (18.5 * height_m * height_m * 10.0).round() / 10.0,
                "unit": "kg",
                "priority": "high",
            }));
        }
    }

    if matches!(
        user.activity_level,
        ActivityLevel::Sedentary | ActivityLevel::Light
    ) {
        suggestions.push(json!({
            "goal_type": GoalType::Exercise,
            "title": "Increase Daily Exercise",
            "description": "Aim for at least 150 minutes of moderate-intensity exercise per week.",
            "target_value": 150,
            "unit": "minutes/week",
            "priority": "medium",
        }));
    }

    suggestions.push(json!({
        "goal_type": GoalType::WaterIntake,
        "title": "Daily Water Intake",
        "description": "Drink at least 8 glasses of water per day for optimal hydration.",
        "target_value": 8,
        "unit": "glasses/day",
        "priority": "medium",
    }));

    suggestions.push(json!({
        "goal_type": GoalType::Sleep,
        "title": "Healthy Sleep Schedule",
        "description": "Aim for 7-9 hours of quality sleep each night.",
        "target_value": 8,
        "unit": "hours/night",
        "priority": "medium",
    }));

    Ok(Json(json!({ "suggestions": suggestions })))
}
