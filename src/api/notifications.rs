use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{parse_enum, require_field};
use crate::errors::ApiError;
use crate::middleware::auth::AuthUser;
use crate::models::notification::{
    Notification, NotificationKind, NotificationStatus, Priority,
};
use crate::scheduling;
use crate::store::postgres::NewNotification;
use crate::AppState;

const MOTIVATIONAL_MESSAGES: &[&str] = &[
    "Great job on tracking your health! Keep up the excellent work!",
    "Every small step counts towards your health goals. You're doing amazing!",
    "Remember: your health is your wealth. Keep investing in yourself!",
    "Consistency is key! You're building healthy habits one day at a time.",
    "Your future self will thank you for the healthy choices you're making today.",
    "Progress, not perfection! Every healthy choice matters.",
    "You're stronger than you think and more capable than you imagine.",
    "Health is a journey, not a destination. Enjoy the process!",
];

// ── Request DTOs ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NotificationListQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateNotificationRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateReminderRequest {
    pub title: String,
    pub message: String,
    pub scheduled_for: DateTime<Utc>,
    pub priority: Option<String>,
}

#[derive(Deserialize)]
pub struct MedicationReminderRequest {
    pub medication_name: String,
    pub dosage: String,
    /// Times of day in HH:MM 24-hour format, e.g. ["08:00", "20:00"].
    pub times: Vec<String>,
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /api/v1/notifications — list, newest first
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<NotificationListQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let status = match params.status.as_deref() {
        Some(raw) => Some(parse_enum::<NotificationStatus>(raw, "notification status")?),
        None => None,
    };
    let kind = match params.kind.as_deref() {
        Some(raw) => Some(parse_enum::<NotificationKind>(raw, "notification type")?),
        None => None,
    };
    let limit = params.limit.unwrap_or(50).clamp(1, 500);

    let notifications = state
        .db
        .list_notifications(auth.id, status, kind, limit)
        .await?;
    Ok(Json(notifications))
}

/// POST /api/v1/notifications
pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let kind = parse_enum::<NotificationKind>(&payload.kind, "notification type")?;
    let title = require_field(&payload.title, "title")?.to_string();
    let message = require_field(&payload.message, "message")?.to_string();
    let priority = match payload.priority.as_deref() {
        Some(raw) => parse_enum::<Priority>(raw, "priority")?,
        None => Priority::Normal,
    };

    // A record enters the machine either deferred or already delivered;
    // later states are unreachable at creation.
    let status = match payload.status.as_deref() {
        Some(raw) => match parse_enum::<NotificationStatus>(raw, "status")? {
            s @ (NotificationStatus::Pending | NotificationStatus::Sent) => s,
            _ => {
                return Err(ApiError::Validation(
                    "status must be 'pending' or 'sent' at creation".into(),
                ))
            }
        },
        None => NotificationStatus::Pending,
    };
    let sent_at = (status == NotificationStatus::Sent).then(Utc::now);

    let notification = state
        .db
        .insert_notification(&NewNotification {
            user_id: auth.id,
            kind,
            title,
            message,
            scheduled_for: payload.scheduled_for,
            priority,
            status,
            sent_at,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// POST /api/v1/notifications/reminders — one scheduled reminder
pub async fn create_reminder(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateReminderRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let title = require_field(&payload.title, "title")?.to_string();
    let message = require_field(&payload.message, "message")?.to_string();
    let priority = match payload.priority.as_deref() {
        Some(raw) => parse_enum::<Priority>(raw, "priority")?,
        None => Priority::Normal,
    };

    let notification = state
        .db
        .insert_notification(&NewNotification {
            user_id: auth.id,
            kind: NotificationKind::Reminder,
            title,
            message,
            scheduled_for: Some(payload.scheduled_for),
            priority,
            status: NotificationStatus::Pending,
            sent_at: None,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// POST /api/v1/notifications/medication-reminders — expand a medication
/// schedule into one pending reminder per (day, time) over the window
pub async fn create_medication_reminders(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<MedicationReminderRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let medication_name = require_field(&payload.medication_name, "medication_name")?.to_string();
    let dosage = require_field(&payload.dosage, "dosage")?.to_string();

    // Validation is all-or-nothing: nothing is written until every time
    // parses.
    let times = scheduling::parse_times(&payload.times).map_err(ApiError::Validation)?;
    let occurrences =
        scheduling::expand_occurrences(&times, Utc::now(), scheduling::DEFAULT_WINDOW_DAYS);

    let title = format!("Medication Reminder: {}", medication_name);
    let message = format!("Time to take your {} ({})", medication_name, dosage);

    let requested = occurrences.len();
    let mut created = Vec::with_capacity(requested);
    for scheduled_for in occurrences {
        let result = state
            .db
            .insert_notification(&NewNotification {
                user_id: auth.id,
                kind: NotificationKind::Reminder,
                title: title.clone(),
                message: message.clone(),
                scheduled_for: Some(scheduled_for),
                priority: Priority::High,
                status: NotificationStatus::Pending,
                sent_at: None,
            })
            .await;
        match result {
            Ok(notification) => created.push(notification),
            // Persistence is per-record past validation; report how far we
            // got instead of swallowing the failure.
            Err(source) => {
                return Err(ApiError::PartialWrite {
                    created: created.len(),
                    requested,
                    source,
                })
            }
        }
    }

    tracing::info!(
        user_id = %auth.id,
        count = created.len(),
        "created medication reminders for {}",
        medication_name
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "reminders_count": created.len(),
            "reminders": created,
        })),
    ))
}

/// POST /api/v1/notifications/motivational — immediate motivational message
pub async fn send_motivational(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let message = MOTIVATIONAL_MESSAGES
        .choose(&mut rand::thread_rng())
        .expect("message list is non-empty")
        .to_string();

    let notification = state
        .db
        .insert_notification(&NewNotification {
            user_id: auth.id,
            kind: NotificationKind::Motivation,
            title: "Daily Motivation".to_string(),
            message,
            scheduled_for: None,
            priority: Priority::Normal,
            status: NotificationStatus::Sent,
            sent_at: Some(Utc::now()),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// GET /api/v1/notifications/due — sweep the caller's due reminders and
/// return the newly sent ones, earliest due first
pub async fn fetch_due(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let sent = state
        .db
        .sweep_due_notifications(auth.id, Utc::now())
        .await?;
    Ok(Json(sent))
}

/// GET /api/v1/notifications/:id
pub async fn get_notification(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = state
        .db
        .get_notification(id, auth.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(notification))
}

/// POST /api/v1/notifications/:id/read — acknowledge one notification
///
/// Only a delivered record can be acknowledged: `sent` transitions,
/// an already-`read` record is an idempotent success, and `pending` or
/// `dismissed` records are rejected.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let existing = state
        .db
        .get_notification(id, auth.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    match existing.status {
        NotificationStatus::Read => Ok(Json(existing)),
        NotificationStatus::Sent => state
            .db
            .mark_notification_read(id, auth.id, Utc::now())
            .await?
            .map(Json)
            // Lost a race with a concurrent transition; the record is no
            // longer acknowledgeable.
            .ok_or_else(|| {
                ApiError::Validation("notification can no longer be marked read".into())
            }),
        NotificationStatus::Pending | NotificationStatus::Dismissed => {
            Err(ApiError::Validation(format!(
                "cannot mark a {} notification as read",
                existing.status.as_str()
            )))
        }
    }
}

/// POST /api/v1/notifications/read-all — acknowledge everything currently
/// delivered; pending records are untouched
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let marked = state
        .db
        .mark_all_notifications_read(auth.id, Utc::now())
        .await?;
    Ok(Json(json!({ "marked_read": marked })))
}

/// POST /api/v1/notifications/:id/dismiss — terminal, allowed from any state
pub async fn dismiss(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = state
        .db
        .dismiss_notification(id, auth.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(notification))
}

/// DELETE /api/v1/notifications/:id
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !state.db.delete_notification(id, auth.id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "deleted": true })))
}
