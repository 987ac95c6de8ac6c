use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: ActivityLevel,
    pub medical_conditions: Value,
    pub emergency_contact: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

/// Profile subset safe to return from auth endpoints: everything except
/// the credential hash and the medical details.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: ActivityLevel,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            age: self.age,
            gender: self.gender.clone(),
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            activity_level: self.activity_level,
            created_at: self.created_at,
        }
    }

    /// Body-mass index from profile height/weight, rounded to one decimal.
    /// None unless both measurements are present.
    pub fn bmi(&self) -> Option<f64> {
        match (self.height_cm, self.weight_kg) {
            (Some(h), Some(w)) if h > 0.0 => {
                let height_m = h / 100.0;
                Some((w / (height_m * height_m) * 10.0).round() / 10.0)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(height_cm: Option<f64>, weight_kg: Option<f64>) -> User {
        User {
            id: Uuid::nil(),
            username: "test".into(),
            email: "test@example.com".into(),
            password_hash: String::new(),
            age: None,
            gender: None,
            height_cm,
            weight_kg,
            activity_level: ActivityLevel::Moderate,
            medical_conditions: serde_json::json!([]),
            emergency_contact: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bmi_rounds_to_one_decimal() {
        let user = user_with(Some(175.0), Some(70.0));
        assert_eq!(user.bmi(), Some(22.9));
    }

    #[test]
    fn test_bmi_requires_both_measurements() {
        assert_eq!(user_with(Some(175.0), None).bmi(), None);
        assert_eq!(user_with(None, Some(70.0)).bmi(), None);
    }

    #[test]
    fn test_profile_omits_password_hash() {
        let mut user = user_with(None, None);
        user.password_hash = "$argon2id$not-for-clients".into();
        let json = serde_json::to_value(user.profile()).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
