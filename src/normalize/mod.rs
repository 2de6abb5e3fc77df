//! Record normalization.
//!
//! Coerces raw, loosely-shaped source records into the canonical record
//! types. A malformed record is isolated: it is excluded, counted in
//! `skipped`, and described by a [`FieldError`]; the rest of the batch
//! is unaffected.

pub mod aliases;

use crate::error::FieldError;
use crate::models::{
    ComplaintRecord, FeedbackRecord, Priority, RawRecord, RecordId, Role, SourceKind, Status,
    UserSummary,
};
use aliases::FieldSpec;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Output of one normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub skipped: usize,
    pub errors: Vec<FieldError>,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
            errors: Vec::new(),
        }
    }
}

/// A record type that can be built from a raw source record.
pub trait Normalize: Sized {
    /// Source this record type is fetched from.
    const SOURCE: SourceKind;

    /// Build one record. `index` is the record's position in the batch.
    fn from_raw(index: usize, raw: &RawRecord) -> Result<Self, FieldError>;
}

/// Normalize a batch of raw records.
pub fn normalize<T: Normalize>(raw_records: &[RawRecord]) -> Normalized<T> {
    let mut out = Normalized {
        records: Vec::with_capacity(raw_records.len()),
        ..Normalized::default()
    };

    for (index, raw) in raw_records.iter().enumerate() {
        match T::from_raw(index, raw) {
            Ok(record) => out.records.push(record),
            Err(err) => {
                debug!("Skipping {} record: {}", T::SOURCE, err);
                out.skipped += 1;
                out.errors.push(err);
            }
        }
    }

    out
}

impl Normalize for ComplaintRecord {
    const SOURCE: SourceKind = SourceKind::Complaints;

    fn from_raw(index: usize, raw: &RawRecord) -> Result<Self, FieldError> {
        let priority = label(raw, &aliases::PRIORITY, index)?;
        let status = label(raw, &aliases::STATUS, index)?;

        Ok(ComplaintRecord {
            id: record_id(raw, &aliases::COMPLAINT_ID, index)?,
            title: text_or_default(raw, &aliases::TITLE),
            category: text_or_default(raw, &aliases::COMPLAINT_CATEGORY),
            priority: Priority::from_label(&priority),
            status: Status::from_label(&status),
            building: text_or_default(raw, &aliases::BUILDING),
            created_at: timestamp(raw, &aliases::CREATED_AT, index)?,
            admin_response: text(raw, &aliases::ADMIN_RESPONSE),
        })
    }
}

impl Normalize for FeedbackRecord {
    const SOURCE: SourceKind = SourceKind::Feedback;

    fn from_raw(index: usize, raw: &RawRecord) -> Result<Self, FieldError> {
        let rating = integer(raw, &aliases::RATING, index)?
            .ok_or_else(|| FieldError::new(index, aliases::RATING.name, "is missing"))?;
        if !aliases::RATING_RANGE.contains(&rating) {
            return Err(FieldError::new(
                index,
                aliases::RATING.name,
                format!("out of range 1-5: {}", rating),
            ));
        }

        Ok(FeedbackRecord {
            id: record_id(raw, &aliases::FEEDBACK_ID, index)?,
            facility: text_or_default(raw, &aliases::FACILITY),
            building: text_or_default(raw, &aliases::BUILDING),
            rating: rating as u8,
            category: text_or_default(raw, &aliases::FEEDBACK_CATEGORY),
            comment: text(raw, &aliases::COMMENT),
            submitter: text_or_default(raw, &aliases::SUBMITTER),
            created_at: timestamp(raw, &aliases::CREATED_AT, index)?,
        })
    }
}

/// A users-source record: either one user, or a pre-counted summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEntry {
    Individual(Role),
    Summary {
        total: usize,
        by_role: BTreeMap<Role, usize>,
    },
}

impl Normalize for UserEntry {
    const SOURCE: SourceKind = SourceKind::Users;

    fn from_raw(index: usize, raw: &RawRecord) -> Result<Self, FieldError> {
        if let Some(total) = count(raw, &aliases::USER_TOTAL, index)? {
            let mut by_role = BTreeMap::new();
            for (role, spec) in [
                (Role::Student, &aliases::STUDENTS),
                (Role::Faculty, &aliases::FACULTY_COUNT),
                (Role::Admin, &aliases::ADMINS),
            ] {
                if let Some(n) = count(raw, spec, index)? {
                    by_role.insert(role, n);
                }
            }
            return Ok(UserEntry::Summary { total, by_role });
        }

        let role = label(raw, &aliases::ROLE, index)?;
        Ok(UserEntry::Individual(Role::from_label(&role)))
    }
}

/// Fold user entries into a single summary.
pub fn summarize_users(entries: &[UserEntry]) -> UserSummary {
    let mut total: usize = 0;
    let mut by_role: BTreeMap<Role, usize> = BTreeMap::new();

    for entry in entries {
        match entry {
            UserEntry::Individual(role) => {
                total = total.saturating_add(1);
                let slot = by_role.entry(*role).or_default();
                *slot = slot.saturating_add(1);
            }
            UserEntry::Summary {
                total: summary_total,
                by_role: counts,
            } => {
                total = total.saturating_add(*summary_total);
                for (role, n) in counts {
                    let slot = by_role.entry(*role).or_default();
                    *slot = slot.saturating_add(*n);
                }
            }
        }
    }

    UserSummary::new(total, by_role)
}

/// First alias holding a non-null, non-blank value.
fn lookup<'a>(raw: &'a RawRecord, spec: &FieldSpec) -> Option<&'a Value> {
    spec.aliases.iter().find_map(|key| match raw.get(*key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    })
}

/// Optional text field. Numbers and booleans are rendered as text.
fn text(raw: &RawRecord, spec: &FieldSpec) -> Option<String> {
    match lookup(raw, spec)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_or_default(raw: &RawRecord, spec: &FieldSpec) -> String {
    text(raw, spec)
        .or_else(|| spec.default.map(str::to_string))
        .unwrap_or_default()
}

/// Enumerated label. Non-text values reject the record.
fn label(raw: &RawRecord, spec: &FieldSpec, index: usize) -> Result<String, FieldError> {
    match lookup(raw, spec) {
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(other) => Err(FieldError::new(
            index,
            spec.name,
            format!("expected text, got {}", other),
        )),
        None => Ok(spec.default.unwrap_or_default().to_string()),
    }
}

/// Integral number, accepting numeric strings and whole floats.
fn integer(raw: &RawRecord, spec: &FieldSpec, index: usize) -> Result<Option<i64>, FieldError> {
    let Some(value) = lookup(raw, spec) else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    };

    parsed
        .map(Some)
        .ok_or_else(|| FieldError::new(index, spec.name, format!("not an integer: {}", value)))
}

/// Non-negative count.
fn count(raw: &RawRecord, spec: &FieldSpec, index: usize) -> Result<Option<usize>, FieldError> {
    match integer(raw, spec, index)? {
        Some(n) if n < 0 => Err(FieldError::new(
            index,
            spec.name,
            format!("negative count: {}", n),
        )),
        Some(n) => Ok(Some(n as usize)),
        None => Ok(None),
    }
}

fn record_id(raw: &RawRecord, spec: &FieldSpec, index: usize) -> Result<RecordId, FieldError> {
    match lookup(raw, spec) {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(RecordId::Int)
            .ok_or_else(|| FieldError::new(index, spec.name, format!("not an integer: {}", n))),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok(s.parse::<i64>()
                .map(RecordId::Int)
                .unwrap_or_else(|_| RecordId::Text(s.to_string())))
        }
        Some(other) => Err(FieldError::new(
            index,
            spec.name,
            format!("unsupported identifier: {}", other),
        )),
        None => Err(FieldError::new(index, spec.name, "is missing")),
    }
}

fn timestamp(
    raw: &RawRecord,
    spec: &FieldSpec,
    index: usize,
) -> Result<Option<DateTime<Utc>>, FieldError> {
    let Some(value) = lookup(raw, spec) else {
        return Ok(None);
    };

    let parsed = value.as_str().and_then(|s| parse_timestamp(s.trim()));
    parsed
        .map(Some)
        .ok_or_else(|| FieldError::new(index, spec.name, format!("not a timestamp: {}", value)))
}

/// Accepts RFC 3339, naive ISO date-times (assumed UTC) and plain dates.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: Value) -> Vec<RawRecord> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_feedback_aliases_and_defaults() {
        let raw = records(json!([
            {"feedback_id": 1, "facility_name": "Library", "building_name": "Main", "rating": 5},
            {"id": "2", "facility": "  Gym ", "building": "Sports Wing", "rating": "4"},
            {"id": 3, "rating": 3}
        ]));

        let out = normalize::<FeedbackRecord>(&raw);
        assert_eq!(out.skipped, 0);
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.records[0].facility, "Library");
        assert_eq!(out.records[1].id, RecordId::Int(2));
        assert_eq!(out.records[1].facility, "Gym");
        assert_eq!(out.records[1].rating, 4);
        assert_eq!(out.records[2].facility, aliases::DEFAULT_FACILITY);
        assert_eq!(out.records[2].building, aliases::DEFAULT_BUILDING);
        assert_eq!(out.records[2].submitter, "Anonymous");
    }

    #[test]
    fn test_first_alias_wins() {
        let raw = records(json!([
            {"id": 1, "facility_name": "Library", "facility": "Ignored", "rating": 4}
        ]));
        let out = normalize::<FeedbackRecord>(&raw);
        assert_eq!(out.records[0].facility, "Library");
    }

    #[test]
    fn test_blank_alias_falls_through() {
        let raw = records(json!([
            {"id": 1, "facility_name": "   ", "facility": "Cafeteria", "rating": 4}
        ]));
        let out = normalize::<FeedbackRecord>(&raw);
        assert_eq!(out.records[0].facility, "Cafeteria");
    }

    #[test]
    fn test_out_of_range_rating_is_skipped() {
        let raw = records(json!([
            {"id": 1, "facility": "Library", "rating": 7},
            {"id": 2, "facility": "Library", "rating": 4}
        ]));

        let out = normalize::<FeedbackRecord>(&raw);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.errors[0].index, 0);
        assert_eq!(out.errors[0].field, "rating");
    }

    #[test]
    fn test_unparsable_and_fractional_ratings_are_skipped() {
        let raw = records(json!([
            {"id": 1, "rating": "great"},
            {"id": 2, "rating": 4.5},
            {"id": 3},
            {"id": 4, "rating": 0},
            {"id": 5, "rating": 5.0}
        ]));

        let out = normalize::<FeedbackRecord>(&raw);
        assert_eq!(out.skipped, 4);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].rating, 5);
        let indices: Vec<usize> = out.errors.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_complaint_unknown_status_is_retained() {
        let raw = records(json!([
            {"complaint_id": 1, "status": "escalated", "priority": "whenever"},
            {"complaint_id": 2}
        ]));

        let out = normalize::<ComplaintRecord>(&raw);
        assert_eq!(out.skipped, 0);
        assert_eq!(out.records[0].status, Status::Unknown);
        assert_eq!(out.records[0].priority, Priority::Unknown);
        assert_eq!(out.records[1].status, Status::Open);
        assert_eq!(out.records[1].priority, Priority::Medium);
        assert_eq!(out.records[1].title, "Untitled complaint");
    }

    #[test]
    fn test_complaint_non_text_status_is_rejected() {
        let raw = records(json!([
            {"complaint_id": 1, "status": 3},
            {"complaint_id": 2, "status": "resolved"}
        ]));

        let out = normalize::<ComplaintRecord>(&raw);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.errors[0].field, "status");
        assert_eq!(out.records[0].status, Status::Resolved);
    }

    #[test]
    fn test_complaint_missing_id_is_rejected() {
        let raw = records(json!([{"title": "Broken tap"}]));
        let out = normalize::<ComplaintRecord>(&raw);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.errors[0].field, "id");
    }

    #[test]
    fn test_numeric_building_reference_is_text() {
        let raw = records(json!([{"complaint_id": "C-9", "building_id": 12}]));
        let out = normalize::<ComplaintRecord>(&raw);
        assert_eq!(out.records[0].id, RecordId::Text("C-9".to_string()));
        assert_eq!(out.records[0].building, "12");
    }

    #[test]
    fn test_timestamp_formats() {
        let raw = records(json!([
            {"complaint_id": 1, "created_at": "2024-05-01T10:00:00Z"},
            {"complaint_id": 2, "created_at": "2024-05-01T10:00:00.123456"},
            {"complaint_id": 3, "created_at": "2024-05-01"},
            {"complaint_id": 4, "created_at": "yesterday"}
        ]));

        let out = normalize::<ComplaintRecord>(&raw);
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.errors[0].field, "created_at");
        assert!(out.records.iter().all(|r| r.created_at.is_some()));
    }

    #[test]
    fn test_user_entries_and_summary() {
        let raw = records(json!([
            {"role": "student"},
            {"role": "faculty"},
            {"name": "no role"},
            {"role": "visitor"}
        ]));

        let out = normalize::<UserEntry>(&raw);
        let summary = summarize_users(&out.records);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.count(Role::Student), 2);
        assert_eq!(summary.count(Role::Faculty), 1);
        assert_eq!(summary.count(Role::Other), 1);
        assert!(!summary.approximate);
    }

    #[test]
    fn test_user_count_summary_mismatch_is_approximate() {
        let raw = records(json!([
            {"total_users": 10, "students": 6, "faculty": 2}
        ]));

        let out = normalize::<UserEntry>(&raw);
        let summary = summarize_users(&out.records);
        assert_eq!(summary.total, 10);
        assert_eq!(summary.count(Role::Student), 6);
        assert!(summary.approximate);
    }

    #[test]
    fn test_negative_user_count_is_rejected() {
        let raw = records(json!([{"total_users": -1}]));
        let out = normalize::<UserEntry>(&raw);
        assert_eq!(out.skipped, 1);
        assert_eq!(summarize_users(&out.records).total, 0);
    }

    #[test]
    fn test_huge_user_counts_saturate() {
        let raw = records(json!([
            {"total_users": 1, "students": 9e18, "faculty": 9e18, "admins": 9e18},
            {"total_users": 9e18, "students": 9e18},
            {"total_users": 9e18, "students": 9e18},
            {"role": "student"}
        ]));
        let out = normalize::<UserEntry>(&raw);
        assert_eq!(out.skipped, 0);

        let summary = summarize_users(&out.records);
        assert!(summary.approximate);
        assert_eq!(summary.count(Role::Faculty), 9_000_000_000_000_000_000);
        assert_eq!(summary.count(Role::Student), usize::MAX);
    }
}
