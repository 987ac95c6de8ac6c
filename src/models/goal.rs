use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goal_type: GoalType,
    pub title: String,
    pub description: Option<String>,
    pub target_value: Option<f64>,
    pub current_value: f64,
    pub unit: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum GoalType {
    WeightLoss,
    WeightGain,
    Exercise,
    MedicationAdherence,
    BloodPressure,
    HeartRate,
    Sleep,
    WaterIntake,
    Diet,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Paused,
    Cancelled,
}

/// Whether a progress value completes the goal. Goals without a target are
/// never auto-completed.
pub fn reaches_target(target_value: Option<f64>, current_value: f64) -> bool {
    matches!(target_value, Some(target) if current_value >= target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_reaching_target_completes() {
        assert!(reaches_target(Some(150.0), 150.0));
        assert!(reaches_target(Some(150.0), 151.0));
    }

    #[test]
    fn test_progress_below_target_does_not_complete() {
        assert!(!reaches_target(Some(150.0), 149.9));
    }

    #[test]
    fn test_untargeted_goal_never_auto_completes() {
        assert!(!reaches_target(None, 1_000_000.0));
    }
}
