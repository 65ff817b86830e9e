//! Field-value histogram aggregation.
//!
//! Reduces the buckets returned for one sponsor into either a total
//! enrollment figure or a per-study-type table.

use crate::error::{QueryError, Result};
use crate::models::{AggregatedResult, Field, FieldValueEntry, StudyTypeCount};

/// Reduce a histogram according to the field it was fetched for.
pub fn aggregate(entries: &[FieldValueEntry], field: Field) -> Result<AggregatedResult> {
    match field {
        Field::EnrollmentCount => total_enrollment(entries).map(AggregatedResult::TotalEnrollment),
        Field::StudyType => Ok(AggregatedResult::StudyTypes(study_type_counts(entries))),
    }
}

/// Sum of `enrollment size * number of studies with that size`.
///
/// Each enrollment size must be a non-negative whole number in decimal
/// digits (surrounding whitespace allowed). Negative sizes such as `-5` and
/// fractional forms such as `10.0` are rejected with `QueryError::Aggregation`
/// rather than coerced.
pub fn total_enrollment(entries: &[FieldValueEntry]) -> Result<u64> {
    entries.iter().try_fold(0_u64, |total, entry| {
        let size = entry
            .value
            .trim()
            .parse::<u64>()
            .map_err(|e| QueryError::Aggregation {
                value: entry.value.clone(),
                reason: e.to_string(),
            })?;

        size.checked_mul(entry.count)
            .and_then(|participants| total.checked_add(participants))
            .ok_or_else(|| QueryError::Aggregation {
                value: entry.value.clone(),
                reason: "enrollment total overflowed".to_string(),
            })
    })
}

/// Study types in server order. Duplicate labels are kept as-is.
pub fn study_type_counts(entries: &[FieldValueEntry]) -> Vec<StudyTypeCount> {
    entries
        .iter()
        .map(|entry| StudyTypeCount {
            study_type: entry.value.clone(),
            studies: entry.count,
        })
        .collect()
}
