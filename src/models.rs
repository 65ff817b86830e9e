//! Data models for field-value queries.
//!
//! This module contains the field selector, the histogram buckets returned
//! by the API, and the per-sponsor records the tool emits.

use crate::error::QueryError;
use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Registry field being aggregated.
///
/// Parsing is case-sensitive and only accepts the API field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// Number of participants enrolled in each study.
    EnrollmentCount,
    /// Interventional, Observational, Expanded Access...
    StudyType,
}

impl Field {
    /// Name of the field as the API expects it.
    pub fn api_name(&self) -> &'static str {
        match self {
            Field::EnrollmentCount => "EnrollmentCount",
            Field::StudyType => "StudyType",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for Field {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EnrollmentCount" => Ok(Field::EnrollmentCount),
            "StudyType" => Ok(Field::StudyType),
            other => Err(QueryError::UnsupportedField(other.to_string())),
        }
    }
}

/// One histogram bucket: `count` studies report exactly `value`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldValueEntry {
    #[serde(rename = "FieldValue", deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(rename = "NStudiesFoundWithValue", deserialize_with = "study_count")]
    pub count: u64,
}

impl FieldValueEntry {
    #[cfg(test)]
    pub fn new(value: impl Into<String>, count: u64) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }
}

// The API is inconsistent about quoting numbers, so accept both forms.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

fn study_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = string_or_number(deserializer)?;
    raw.trim()
        .parse::<u64>()
        .map_err(|e| de::Error::custom(format!("invalid study count '{}': {}", raw, e)))
}

/// Number of studies of one study type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyTypeCount {
    pub study_type: String,
    pub studies: u64,
}

/// Reduced histogram for one sponsor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatedResult {
    /// Sum of enrollment size times number of studies with that size.
    TotalEnrollment(u64),
    /// Study types in the order the API returned them.
    StudyTypes(Vec<StudyTypeCount>),
}

/// Filters shared by every sponsor in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub field: Field,
    pub status: String,
    pub location: String,
}

/// The record emitted for one sponsor.
#[derive(Debug, Clone, Serialize)]
pub struct SponsorReport {
    pub sponsor: String,
    pub field: Field,
    pub status: String,
    pub location: String,
    pub result: AggregatedResult,
    pub queried_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_parse_is_case_sensitive() {
        assert_eq!(
            "EnrollmentCount".parse::<Field>().unwrap(),
            Field::EnrollmentCount
        );
        assert_eq!("StudyType".parse::<Field>().unwrap(), Field::StudyType);
        assert!(matches!(
            "studytype".parse::<Field>(),
            Err(QueryError::UnsupportedField(name)) if name == "studytype"
        ));
    }

    #[test]
    fn test_field_display_round_trips() {
        for field in [Field::EnrollmentCount, Field::StudyType] {
            assert_eq!(field.to_string().parse::<Field>().unwrap(), field);
        }
    }

    #[test]
    fn test_entry_accepts_quoted_and_bare_numbers() {
        let json = r#"[
            {"FieldValue": "120", "NStudiesFoundWithValue": "4"},
            {"FieldValue": 35, "NStudiesFoundWithValue": 2}
        ]"#;

        let entries: Vec<FieldValueEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(
            entries,
            vec![FieldValueEntry::new("120", 4), FieldValueEntry::new("35", 2)]
        );
    }

    #[test]
    fn test_entry_rejects_negative_count() {
        let json = r#"{"FieldValue": "Interventional", "NStudiesFoundWithValue": "-1"}"#;
        assert!(serde_json::from_str::<FieldValueEntry>(json).is_err());
    }

    #[test]
    fn test_aggregated_result_json_shape() {
        let result = AggregatedResult::StudyTypes(vec![StudyTypeCount {
            study_type: "Observational".to_string(),
            studies: 3,
        }]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["study_types"][0]["study_type"], "Observational");
        assert_eq!(json["study_types"][0]["studies"], 3);

        let total = serde_json::to_value(AggregatedResult::TotalEnrollment(25)).unwrap();
        assert_eq!(total["total_enrollment"], 25);
    }
}
