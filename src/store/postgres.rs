use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::goal::{Goal, GoalStatus, GoalType};
use crate::models::health::{HealthRecord, RecordType};
use crate::models::notification::{
    Notification, NotificationKind, NotificationStatus, Priority,
};
use crate::models::user::{ActivityLevel, User};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, message, scheduled_for, priority, status, created_at, sent_at, read_at";

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // -- User Operations --

    pub async fn insert_user(&self, user: &NewUser) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, email, password_hash, age, gender, height_cm, weight_kg, activity_level, medical_conditions, emergency_contact)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING *"#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.age)
        .bind(&user.gender)
        .bind(user.height_cm)
        .bind(user.weight_kg)
        .bind(user.activity_level)
        .bind(&user.medical_conditions)
        .bind(&user.emergency_contact)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// True if `username` is held by a user other than `exclude`.
    pub async fn username_in_use(
        &self,
        username: &str,
        exclude: Option<Uuid>,
    ) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn email_in_use(&self, email: &str, exclude: Option<Uuid>) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn update_user_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET username = COALESCE($1, username),
                   email = COALESCE($2, email),
                   age = COALESCE($3, age),
                   gender = COALESCE($4, gender),
                   height_cm = COALESCE($5, height_cm),
                   weight_kg = COALESCE($6, weight_kg),
                   activity_level = COALESCE($7, activity_level),
                   medical_conditions = COALESCE($8, medical_conditions),
                   emergency_contact = COALESCE($9, emergency_contact),
                   updated_at = NOW()
               WHERE id = $10
               RETURNING *"#,
        )
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(changes.age)
        .bind(&changes.gender)
        .bind(changes.height_cm)
        .bind(changes.weight_kg)
        .bind(changes.activity_level)
        .bind(&changes.medical_conditions)
        .bind(&changes.emergency_contact)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Health Record Operations --

    pub async fn insert_health_record(
        &self,
        record: &NewHealthRecord,
    ) -> anyhow::Result<HealthRecord> {
        let row = sqlx::query_as::<_, HealthRecord>(
            r#"INSERT INTO health_records (user_id, record_type, value, notes, recorded_at)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING *"#,
        )
        .bind(record.user_id)
        .bind(record.record_type)
        .bind(&record.value)
        .bind(&record.notes)
        .bind(record.recorded_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_health_records(
        &self,
        owner: Uuid,
        record_type: Option<RecordType>,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        limit: i64,
    ) -> anyhow::Result<Vec<HealthRecord>> {
        let rows = sqlx::query_as::<_, HealthRecord>(
            r#"SELECT * FROM health_records
               WHERE user_id = $1
                 AND ($2::varchar IS NULL OR record_type = $2)
                 AND ($3::timestamptz IS NULL OR recorded_at >= $3)
                 AND ($4::timestamptz IS NULL OR recorded_at <= $4)
               ORDER BY recorded_at DESC
               LIMIT $5"#,
        )
        .bind(owner)
        .bind(record_type)
        .bind(start_date)
        .bind(end_date)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_health_record(
        &self,
        id: Uuid,
        owner: Uuid,
    ) -> anyhow::Result<Option<HealthRecord>> {
        let row = sqlx::query_as::<_, HealthRecord>(
            "SELECT * FROM health_records WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_health_record(
        &self,
        id: Uuid,
        owner: Uuid,
        value: Option<&Value>,
        notes: Option<&str>,
        recorded_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Option<HealthRecord>> {
        let row = sqlx::query_as::<_, HealthRecord>(
            r#"UPDATE health_records
               SET value = COALESCE($1, value),
                   notes = COALESCE($2, notes),
                   recorded_at = COALESCE($3, recorded_at)
               WHERE id = $4 AND user_id = $5
               RETURNING *"#,
        )
        .bind(value)
        .bind(notes)
        .bind(recorded_at)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_health_record(&self, id: Uuid, owner: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM health_records WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Latest record per type for one user, for the summary view.
    pub async fn latest_records_per_type(&self, owner: Uuid) -> anyhow::Result<Vec<HealthRecord>> {
        let rows = sqlx::query_as::<_, HealthRecord>(
            r#"SELECT DISTINCT ON (record_type) *
               FROM health_records
               WHERE user_id = $1
               ORDER BY record_type, recorded_at DESC"#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Record counts per type since `since`, for the summary view.
    pub async fn record_counts_since(
        &self,
        owner: Uuid,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"SELECT record_type, COUNT(*)
               FROM health_records
               WHERE user_id = $1 AND recorded_at >= $2
               GROUP BY record_type"#,
        )
        .bind(owner)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_health_records(&self, owner: Uuid) -> anyhow::Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM health_records WHERE user_id = $1")
                .bind(owner)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Records of one type since `since`, ascending, for trend series.
    pub async fn records_of_type_since(
        &self,
        owner: Uuid,
        record_type: RecordType,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<HealthRecord>> {
        let rows = sqlx::query_as::<_, HealthRecord>(
            r#"SELECT * FROM health_records
               WHERE user_id = $1 AND record_type = $2 AND recorded_at >= $3
               ORDER BY recorded_at ASC"#,
        )
        .bind(owner)
        .bind(record_type)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // -- Goal Operations --

    pub async fn insert_goal(&self, goal: &NewGoal) -> anyhow::Result<Goal> {
        let row = sqlx::query_as::<_, Goal>(
            r#"INSERT INTO goals (user_id, goal_type, title, description, target_value, current_value, unit, deadline, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING *"#,
        )
        .bind(goal.user_id)
        .bind(goal.goal_type)
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.target_value)
        .bind(goal.current_value)
        .bind(&goal.unit)
        .bind(goal.deadline)
        .bind(goal.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_goals(
        &self,
        owner: Uuid,
        status: Option<GoalStatus>,
        goal_type: Option<GoalType>,
    ) -> anyhow::Result<Vec<Goal>> {
        let rows = sqlx::query_as::<_, Goal>(
            r#"SELECT * FROM goals
               WHERE user_id = $1
                 AND ($2::varchar IS NULL OR status = $2)
                 AND ($3::varchar IS NULL OR goal_type = $3)
               ORDER BY created_at DESC"#,
        )
        .bind(owner)
        .bind(status)
        .bind(goal_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_goal(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Goal>> {
        let row = sqlx::query_as::<_, Goal>("SELECT * FROM goals WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn update_goal(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &GoalChanges,
    ) -> anyhow::Result<Option<Goal>> {
        let row = sqlx::query_as::<_, Goal>(
            r#"UPDATE goals
               SET title = COALESCE($1, title),
                   description = COALESCE($2, description),
                   target_value = COALESCE($3, target_value),
                   current_value = COALESCE($4, current_value),
                   unit = COALESCE($5, unit),
                   deadline = COALESCE($6, deadline),
                   status = COALESCE($7, status),
                   updated_at = NOW()
               WHERE id = $8 AND user_id = $9
               RETURNING *"#,
        )
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.target_value)
        .bind(changes.current_value)
        .bind(&changes.unit)
        .bind(changes.deadline)
        .bind(changes.status)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_goal(&self, id: Uuid, owner: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Notification Operations --

    pub async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, sqlx::Error> {
        let sql = format!(
            r#"INSERT INTO notifications (user_id, kind, title, message, scheduled_for, priority, status, sent_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {NOTIFICATION_COLUMNS}"#
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(notification.user_id)
            .bind(notification.kind)
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.scheduled_for)
            .bind(notification.priority)
            .bind(notification.status)
            .bind(notification.sent_at)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn list_notifications(
        &self,
        owner: Uuid,
        status: Option<NotificationStatus>,
        kind: Option<NotificationKind>,
        limit: i64,
    ) -> anyhow::Result<Vec<Notification>> {
        let sql = format!(
            r#"SELECT {NOTIFICATION_COLUMNS} FROM notifications
               WHERE user_id = $1
                 AND ($2::varchar IS NULL OR status = $2)
                 AND ($3::varchar IS NULL OR kind = $3)
               ORDER BY created_at DESC
               LIMIT $4"#
        );
        let rows = sqlx::query_as::<_, Notification>(&sql)
            .bind(owner)
            .bind(status)
            .bind(kind)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_notification(
        &self,
        id: Uuid,
        owner: Uuid,
    ) -> anyhow::Result<Option<Notification>> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1 AND user_id = $2"
        );
        let row = sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Acknowledge one notification. Status-guarded: only a currently-`sent`
    /// record transitions, so a concurrent acknowledge or dismissal cannot
    /// be overwritten.
    pub async fn mark_notification_read(
        &self,
        id: Uuid,
        owner: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Notification>> {
        let sql = format!(
            r#"UPDATE notifications
               SET status = 'read', read_at = $3
               WHERE id = $1 AND user_id = $2 AND status = 'sent'
               RETURNING {NOTIFICATION_COLUMNS}"#
        );
        let row = sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(owner)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Bulk acknowledge: touches only currently-`sent` records, never
    /// `pending` ones. Returns the number transitioned.
    pub async fn mark_all_notifications_read(
        &self,
        owner: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'read', read_at = $2 WHERE user_id = $1 AND status = 'sent'",
        )
        .bind(owner)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Dismiss from any state. Terminal; repeated dismissal is a no-op that
    /// still returns the record.
    pub async fn dismiss_notification(
        &self,
        id: Uuid,
        owner: Uuid,
    ) -> anyhow::Result<Option<Notification>> {
        let sql = format!(
            r#"UPDATE notifications
               SET status = 'dismissed'
               WHERE id = $1 AND user_id = $2
               RETURNING {NOTIFICATION_COLUMNS}"#
        );
        let row = sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn delete_notification(&self, id: Uuid, owner: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Promote one user's due `pending` notifications to `sent`.
    ///
    /// A single conditional UPDATE: the status filter in the WHERE clause is
    /// what makes concurrent sweeps at-most-once per record, since two
    /// invocations cannot both match the same row as `pending`. Rows with no
    /// `scheduled_for` are immediate-delivery records and are never swept.
    ///
    /// Returns the newly sent records, earliest due first. No due rows means
    /// no writes.
    pub async fn sweep_due_notifications(
        &self,
        owner: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Notification>> {
        let sql = format!(
            r#"UPDATE notifications
               SET status = 'sent', sent_at = $2
               WHERE user_id = $1
                 AND status = 'pending'
                 AND scheduled_for IS NOT NULL
                 AND scheduled_for <= $2
               RETURNING {NOTIFICATION_COLUMNS}"#
        );
        let mut rows = sqlx::query_as::<_, Notification>(&sql)
            .bind(owner)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        // RETURNING order is unspecified; the delivery contract is earliest
        // due first.
        rows.sort_by_key(|n| n.scheduled_for);
        Ok(rows)
    }

    /// Sweep across all users, for the background delivery job. Same
    /// status-guarded update, so it composes safely with per-user sweeps.
    pub async fn sweep_all_due_notifications(&self, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"UPDATE notifications
               SET status = 'sent', sent_at = $1
               WHERE status = 'pending'
                 AND scheduled_for IS NOT NULL
                 AND scheduled_for <= $1"#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

// -- Insert / update parameter structs --

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: ActivityLevel,
    pub medical_conditions: Value,
    pub emergency_contact: Value,
}

#[derive(Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub medical_conditions: Option<Value>,
    pub emergency_contact: Option<Value>,
}

pub struct NewHealthRecord {
    pub user_id: Uuid,
    pub record_type: RecordType,
    pub value: Value,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

pub struct NewGoal {
    pub user_id: Uuid,
    pub goal_type: GoalType,
    pub title: String,
    pub description: Option<String>,
    pub target_value: Option<f64>,
    pub current_value: f64,
    pub unit: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: GoalStatus,
}

#[derive(Default)]
pub struct GoalChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub unit: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<GoalStatus>,
}

pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: NotificationStatus,
    pub sent_at: Option<DateTime<Utc>>,
}
