use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HealthRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub record_type: RecordType,
    /// JSONB payload, validated against `record_type` before it is accepted.
    pub value: Value,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum RecordType {
    BloodPressure,
    HeartRate,
    Weight,
    Exercise,
    Diet,
    Medication,
    Symptoms,
    Sleep,
    WaterIntake,
}

impl RecordType {
    pub const ALL: [RecordType; 9] = [
        RecordType::BloodPressure,
        RecordType::HeartRate,
        RecordType::Weight,
        RecordType::Exercise,
        RecordType::Diet,
        RecordType::Medication,
        RecordType::Symptoms,
        RecordType::Sleep,
        RecordType::WaterIntake,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::BloodPressure => "blood_pressure",
            RecordType::HeartRate => "heart_rate",
            RecordType::Weight => "weight",
            RecordType::Exercise => "exercise",
            RecordType::Diet => "diet",
            RecordType::Medication => "medication",
            RecordType::Symptoms => "symptoms",
            RecordType::Sleep => "sleep",
            RecordType::WaterIntake => "water_intake",
        }
    }
}

/// Validate a record payload against its declared type.
///
/// Measurements must arrive in the shape the type declares; free-form dicts
/// are not trusted past this boundary.
pub fn validate_value(record_type: RecordType, value: &Value) -> Result<(), String> {
    match record_type {
        RecordType::BloodPressure => {
            let obj = value
                .as_object()
                .ok_or("blood_pressure value must be an object with systolic and diastolic")?;
            for field in ["systolic", "diastolic"] {
                match obj.get(field).and_then(Value::as_f64) {
                    Some(v) if v > 0.0 => {}
                    _ => return Err(format!("blood_pressure value requires numeric '{}'", field)),
                }
            }
            Ok(())
        }
        RecordType::HeartRate | RecordType::Weight | RecordType::Sleep | RecordType::WaterIntake => {
            match value.as_f64() {
                Some(v) if v.is_finite() && v > 0.0 => Ok(()),
                _ => Err(format!(
                    "{} value must be a positive number",
                    record_type.as_str()
                )),
            }
        }
        RecordType::Exercise | RecordType::Diet | RecordType::Medication | RecordType::Symptoms => {
            match value {
                Value::Object(_) => Ok(()),
                Value::String(s) if !s.trim().is_empty() => Ok(()),
                _ => Err(format!(
                    "{} value must be an object or a non-empty string",
                    record_type.as_str()
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blood_pressure_requires_both_readings() {
        assert!(validate_value(
            RecordType::BloodPressure,
            &json!({"systolic": 120, "diastolic": 80})
        )
        .is_ok());
        assert!(validate_value(RecordType::BloodPressure, &json!({"systolic": 120})).is_err());
        assert!(validate_value(RecordType::BloodPressure, &json!(120)).is_err());
        assert!(validate_value(
            RecordType::BloodPressure,
            &json!({"systolic": "high", "diastolic": 80})
        )
        .is_err());
    }

    #[test]
    fn test_scalar_types_require_positive_numbers() {
        assert!(validate_value(RecordType::HeartRate, &json!(72)).is_ok());
        assert!(validate_value(RecordType::Weight, &json!(81.5)).is_ok());
        assert!(validate_value(RecordType::Sleep, &json!(7.5)).is_ok());
        assert!(validate_value(RecordType::HeartRate, &json!(-3)).is_err());
        assert!(validate_value(RecordType::Weight, &json!("81kg")).is_err());
        assert!(validate_value(RecordType::WaterIntake, &json!(null)).is_err());
    }

    #[test]
    fn test_descriptive_types_accept_object_or_string() {
        assert!(validate_value(
            RecordType::Exercise,
            &json!({"activity": "running", "duration_minutes": 30})
        )
        .is_ok());
        assert!(validate_value(RecordType::Symptoms, &json!("mild headache")).is_ok());
        assert!(validate_value(RecordType::Diet, &json!("")).is_err());
        assert!(validate_value(RecordType::Medication, &json!(42)).is_err());
    }

    #[test]
    fn test_record_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RecordType::BloodPressure).unwrap(),
            "\"blood_pressure\""
        );
        assert_eq!(
            serde_json::to_string(&RecordType::WaterIntake).unwrap(),
            "\"water_intake\""
        );
    }
}
