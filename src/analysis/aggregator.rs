//! Metrics aggregation.
//!
//! Reduces normalized complaint, feedback and user collections into a
//! [`MetricsSnapshot`]. Every enumerated bucket is present in the output,
//! zero-filled, so a degraded snapshot has the same shape as a healthy one.

use crate::error::AggregationError;
use crate::models::{
    ComplaintRecord, FeedbackRecord, HealthStatus, MetricsSnapshot, Priority, SourceHealth,
    SourceKind, Status, UserSummary,
};
use std::collections::BTreeMap;

/// What a refresh cycle obtained from one source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome<T> {
    /// Fetched and normalized; `skipped` records were excluded.
    Loaded { records: T, skipped: usize },
    /// The source was attempted and failed as a whole.
    Failed { reason: String },
    /// The source was never attempted. Aggregating over this is a caller defect.
    NotAttempted,
}

impl<T> SourceOutcome<T> {
    /// A clean load with nothing skipped.
    pub fn loaded(records: T) -> Self {
        SourceOutcome::Loaded {
            records,
            skipped: 0,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        SourceOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn records(&self) -> Option<&T> {
        match self {
            SourceOutcome::Loaded { records, .. } => Some(records),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, SourceOutcome::Loaded { .. })
    }

    /// Transform loaded records, keeping the skip count and failure state.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SourceOutcome<U> {
        match self {
            SourceOutcome::Loaded { records, skipped } => SourceOutcome::Loaded {
                records: f(records),
                skipped,
            },
            SourceOutcome::Failed { reason } => SourceOutcome::Failed { reason },
            SourceOutcome::NotAttempted => SourceOutcome::NotAttempted,
        }
    }

    /// Health entry for this outcome. `size` counts the loaded records.
    fn health(
        &self,
        kind: SourceKind,
        size: impl Fn(&T) -> usize,
    ) -> Result<SourceHealth, AggregationError> {
        match self {
            SourceOutcome::Loaded { records, skipped } => Ok(SourceHealth {
                status: if *skipped > 0 {
                    HealthStatus::Partial
                } else {
                    HealthStatus::Ok
                },
                records: size(records),
                skipped: *skipped,
                error: None,
            }),
            SourceOutcome::Failed { reason } => Ok(SourceHealth {
                status: HealthStatus::Failed,
                records: 0,
                skipped: 0,
                error: Some(reason.clone()),
            }),
            SourceOutcome::NotAttempted => Err(AggregationError::MissingSource(kind)),
        }
    }
}

/// Complaint counts gathered in a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintBreakdown {
    pub total: usize,
    pub by_status: BTreeMap<Status, usize>,
    pub by_priority: BTreeMap<Priority, usize>,
    pub by_category: BTreeMap<String, usize>,
}

/// Feedback counts gathered in a single pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackBreakdown {
    pub total: usize,
    pub by_rating: BTreeMap<u8, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub rating_sum: u64,
}

impl FeedbackBreakdown {
    /// Mean rating, 0.0 when empty.
    pub fn average_rating(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.rating_sum as f64 / self.total as f64
        }
    }
}

/// Build a metrics snapshot from the three source outcomes.
pub fn aggregate(
    complaints: &SourceOutcome<Vec<ComplaintRecord>>,
    feedback: &SourceOutcome<Vec<FeedbackRecord>>,
    users: &SourceOutcome<UserSummary>,
) -> Result<MetricsSnapshot, AggregationError> {
    let mut source_health = BTreeMap::new();
    source_health.insert(
        SourceKind::Users,
        users.health(SourceKind::Users, |u| u.total)?,
    );
    source_health.insert(
        SourceKind::Complaints,
        complaints.health(SourceKind::Complaints, Vec::len)?,
    );
    source_health.insert(
        SourceKind::Feedback,
        feedback.health(SourceKind::Feedback, Vec::len)?,
    );

    let complaint_stats =
        complaint_breakdown(complaints.records().map(Vec::as_slice).unwrap_or_default());
    let feedback_stats =
        feedback_breakdown(feedback.records().map(Vec::as_slice).unwrap_or_default());

    let resolved = complaint_stats
        .by_status
        .get(&Status::Resolved)
        .copied()
        .unwrap_or(0);

    Ok(MetricsSnapshot {
        users: users.records().cloned().unwrap_or_default(),
        total_complaints: complaint_stats.total,
        resolution_rate: resolution_rate(resolved, complaint_stats.total),
        complaints_by_status: complaint_stats.by_status,
        complaints_by_priority: complaint_stats.by_priority,
        complaints_by_category: complaint_stats.by_category,
        total_feedback: feedback_stats.total,
        average_rating: feedback_stats.average_rating(),
        ratings_by_bucket: feedback_stats.by_rating,
        feedback_by_category: feedback_stats.by_category,
        source_health,
    })
}

/// Count complaints by status, priority and category.
pub fn complaint_breakdown(complaints: &[ComplaintRecord]) -> ComplaintBreakdown {
    let mut by_status: BTreeMap<Status, usize> = Status::ALL.iter().map(|s| (*s, 0)).collect();
    let mut by_priority: BTreeMap<Priority, usize> =
        Priority::ALL.iter().map(|p| (*p, 0)).collect();
    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();

    for complaint in complaints {
        *by_status.entry(complaint.status).or_default() += 1;
        *by_priority.entry(complaint.priority).or_default() += 1;
        *by_category.entry(complaint.category.clone()).or_default() += 1;
    }

    ComplaintBreakdown {
        total: complaints.len(),
        by_status,
        by_priority,
        by_category,
    }
}

/// Count feedback by rating bucket and category.
pub fn feedback_breakdown(feedback: &[FeedbackRecord]) -> FeedbackBreakdown {
    let mut by_rating: BTreeMap<u8, usize> = (1..=5).map(|r| (r, 0)).collect();
    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    let mut rating_sum = 0u64;

    for entry in feedback {
        *by_rating.entry(entry.rating).or_default() += 1;
        *by_category.entry(entry.category.clone()).or_default() += 1;
        rating_sum += u64::from(entry.rating);
    }

    FeedbackBreakdown {
        total: feedback.len(),
        by_rating,
        by_category,
        rating_sum,
    }
}

/// Resolved share of all complaints, 0.0 when there are none.
pub fn resolution_rate(resolved: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        resolved as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordId, Role};

    fn complaint(id: i64, status: Status, priority: Priority) -> ComplaintRecord {
        ComplaintRecord {
            id: RecordId::Int(id),
            title: "Broken light".to_string(),
            category: "electrical".to_string(),
            priority,
            status,
            building: "Main".to_string(),
            created_at: None,
            admin_response: None,
        }
    }

    fn feedback(id: i64, rating: u8) -> FeedbackRecord {
        FeedbackRecord {
            id: RecordId::Int(id),
            facility: "Library".to_string(),
            building: "Main".to_string(),
            rating,
            category: "cleanliness".to_string(),
            comment: None,
            submitter: "Avery".to_string(),
            created_at: None,
        }
    }

    fn users() -> SourceOutcome<UserSummary> {
        SourceOutcome::loaded(UserSummary::new(
            2,
            [(Role::Student, 1), (Role::Admin, 1)].into_iter().collect(),
        ))
    }

    #[test]
    fn test_status_and_priority_counts() {
        let complaints = SourceOutcome::loaded(vec![
            complaint(1, Status::Pending, Priority::High),
            complaint(2, Status::Resolved, Priority::Low),
            complaint(3, Status::Resolved, Priority::High),
        ]);

        let snapshot =
            aggregate(&complaints, &SourceOutcome::loaded(Vec::new()), &users()).unwrap();

        assert_eq!(snapshot.total_complaints, 3);
        assert_eq!(snapshot.status_count(Status::Pending), 1);
        assert_eq!(snapshot.status_count(Status::Resolved), 2);
        assert_eq!(snapshot.status_count(Status::Open), 0);
        assert_eq!(snapshot.priority_count(Priority::High), 2);
        assert!((snapshot.resolution_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(snapshot.complaints_by_category.get("electrical"), Some(&3));
    }

    #[test]
    fn test_unknown_buckets_are_surfaced() {
        let complaints = SourceOutcome::loaded(vec![
            complaint(1, Status::Unknown, Priority::Unknown),
            complaint(2, Status::Open, Priority::Medium),
        ]);

        let snapshot =
            aggregate(&complaints, &SourceOutcome::loaded(Vec::new()), &users()).unwrap();
        assert_eq!(snapshot.status_count(Status::Unknown), 1);
        assert_eq!(snapshot.priority_count(Priority::Unknown), 1);
    }

    #[test]
    fn test_average_rating_is_zero_when_empty() {
        let snapshot = aggregate(
            &SourceOutcome::loaded(Vec::new()),
            &SourceOutcome::loaded(Vec::new()),
            &users(),
        )
        .unwrap();

        assert_eq!(snapshot.average_rating, 0.0);
        assert_eq!(snapshot.resolution_rate, 0.0);
        assert_eq!(snapshot.ratings_by_bucket.len(), 5);
        assert!(snapshot.ratings_by_bucket.values().all(|c| *c == 0));
    }

    #[test]
    fn test_average_rating_and_buckets() {
        let fb = SourceOutcome::loaded(vec![feedback(1, 5), feedback(2, 3), feedback(3, 4)]);
        let snapshot = aggregate(&SourceOutcome::loaded(Vec::new()), &fb, &users()).unwrap();

        assert_eq!(snapshot.total_feedback, 3);
        assert!((snapshot.average_rating - 4.0).abs() < 1e-9);
        assert_eq!(snapshot.ratings_by_bucket.get(&5), Some(&1));
        assert_eq!(snapshot.ratings_by_bucket.get(&1), Some(&0));
        assert!((0.0..=5.0).contains(&snapshot.average_rating));
    }

    #[test]
    fn test_failed_feedback_source_degrades_to_zero() {
        let complaints = SourceOutcome::loaded(vec![complaint(1, Status::Resolved, Priority::Low)]);
        let fb = SourceOutcome::failed("connection refused");

        let snapshot = aggregate(&complaints, &fb, &users()).unwrap();

        assert_eq!(snapshot.health(SourceKind::Feedback), Some(HealthStatus::Failed));
        assert_eq!(snapshot.health(SourceKind::Complaints), Some(HealthStatus::Ok));
        assert_eq!(snapshot.total_feedback, 0);
        assert_eq!(snapshot.average_rating, 0.0);
        assert_eq!(snapshot.total_complaints, 1);
        assert_eq!(snapshot.resolution_rate, 1.0);
        assert!(snapshot.is_degraded());
    }

    #[test]
    fn test_skips_mark_source_partial() {
        let fb = SourceOutcome::Loaded {
            records: vec![feedback(1, 4)],
            skipped: 2,
        };
        let snapshot = aggregate(&SourceOutcome::loaded(Vec::new()), &fb, &users()).unwrap();

        let health = &snapshot.source_health[&SourceKind::Feedback];
        assert_eq!(health.status, HealthStatus::Partial);
        assert_eq!(health.records, 1);
        assert_eq!(health.skipped, 2);
        assert!(!snapshot.is_degraded());
    }

    #[test]
    fn test_not_attempted_source_is_an_error() {
        let result = aggregate(
            &SourceOutcome::loaded(Vec::new()),
            &SourceOutcome::NotAttempted,
            &users(),
        );
        assert_eq!(
            result,
            Err(AggregationError::MissingSource(SourceKind::Feedback))
        );
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let complaints = SourceOutcome::loaded(vec![
            complaint(1, Status::Open, Priority::Urgent),
            complaint(2, Status::Closed, Priority::Low),
        ]);
        let fb = SourceOutcome::loaded(vec![feedback(1, 2), feedback(2, 5)]);

        let first = aggregate(&complaints, &fb, &users()).unwrap();
        let second = aggregate(&complaints, &fb, &users()).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_resolution_rate_bounds() {
        assert_eq!(resolution_rate(0, 0), 0.0);
        assert_eq!(resolution_rate(3, 3), 1.0);
        assert!((resolution_rate(1, 4) - 0.25).abs() < 1e-9);
    }
}
