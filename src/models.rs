//! Data models for the dashboard engine.
//!
//! This module contains the canonical record types produced by the
//! normalizer and the value objects produced by each refresh cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A raw, untyped record as handed over by a source fetcher.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// The three independent data sources behind a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Users,
    Complaints,
    Feedback,
}

impl SourceKind {
    /// All source kinds, in fetch order.
    pub const ALL: [SourceKind; 3] = [SourceKind::Users, SourceKind::Complaints, SourceKind::Feedback];

    /// Name used for envelope keys and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Users => "users",
            SourceKind::Complaints => "complaints",
            SourceKind::Feedback => "feedback",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record identifier. Upstream sources use integer keys, but opaque strings are tolerated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// Complaint priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
    /// Unrecognized upstream value.
    Unknown,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
        Priority::Unknown,
    ];

    /// Map a raw label onto a priority. Unrecognized labels land in `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match canonical_label(label).as_str() {
            "low" => Priority::Low,
            "medium" | "normal" => Priority::Medium,
            "high" => Priority::High,
            "urgent" | "critical" => Priority::Urgent,
            _ => Priority::Unknown,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
            Priority::Urgent => write!(f, "Urgent"),
            Priority::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Complaint lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    Pending,
    InProgress,
    Resolved,
    Closed,
    /// Unrecognized upstream value.
    Unknown,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Open,
        Status::Pending,
        Status::InProgress,
        Status::Resolved,
        Status::Closed,
        Status::Unknown,
    ];

    /// Map a raw label onto a status. Unrecognized labels land in `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match canonical_label(label).as_str() {
            "open" | "new" => Status::Open,
            "pending" => Status::Pending,
            "in_progress" | "inprogress" => Status::InProgress,
            "resolved" => Status::Resolved,
            "closed" => Status::Closed,
            _ => Status::Unknown,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Open => write!(f, "Open"),
            Status::Pending => write!(f, "Pending"),
            Status::InProgress => write!(f, "In Progress"),
            Status::Resolved => write!(f, "Resolved"),
            Status::Closed => write!(f, "Closed"),
            Status::Unknown => write!(f, "Unknown"),
        }
    }
}

/// User role used to partition the user count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
    Other,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Student, Role::Faculty, Role::Admin, Role::Other];

    pub fn from_label(label: &str) -> Self {
        match canonical_label(label).as_str() {
            "student" | "students" => Role::Student,
            "faculty" | "staff" => Role::Faculty,
            "admin" | "admins" | "administrator" => Role::Admin,
            _ => Role::Other,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "Student"),
            Role::Faculty => write!(f, "Faculty"),
            Role::Admin => write!(f, "Admin"),
            Role::Other => write!(f, "Other"),
        }
    }
}

/// Lowercase a label and fold `-` and spaces into `_`.
fn canonical_label(label: &str) -> String {
    label.trim().to_lowercase().replace(['-', ' '], "_")
}

/// A normalized complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintRecord {
    pub id: RecordId,
    pub title: String,
    pub category: String,
    pub priority: Priority,
    pub status: Status,
    pub building: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_response: Option<String>,
}

/// A normalized facility feedback entry. `rating` is always within 1..=5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: RecordId,
    pub facility: String,
    pub building: String,
    pub rating: u8,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub submitter: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Total user count plus a partition by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Authoritative total.
    pub total: usize,
    /// Count per role; every role is present.
    pub by_role: BTreeMap<Role, usize>,
    /// Set when the role counts do not add up to `total`.
    pub approximate: bool,
}

impl Default for UserSummary {
    fn default() -> Self {
        Self {
            total: 0,
            by_role: Role::ALL.iter().map(|r| (*r, 0)).collect(),
            approximate: false,
        }
    }
}

impl UserSummary {
    /// Build a summary, flagging the partition when it disagrees with the total.
    pub fn new(total: usize, by_role: BTreeMap<Role, usize>) -> Self {
        let mut summary = Self::default();
        summary.by_role.extend(by_role);
        let partition = summary
            .by_role
            .values()
            .fold(0usize, |acc, n| acc.saturating_add(*n));
        summary.total = total;
        summary.approximate = partition != total;
        summary
    }

    pub fn count(&self, role: Role) -> usize {
        self.by_role.get(&role).copied().unwrap_or(0)
    }
}

/// Health of a single source after a refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    /// Loaded, but some records were skipped.
    Partial,
    Failed,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Ok => write!(f, "ok"),
            HealthStatus::Partial => write!(f, "partial"),
            HealthStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Per-source health entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceHealth {
    pub status: HealthStatus,
    /// Records that survived normalization.
    pub records: usize,
    /// Records excluded by the normalizer.
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub users: UserSummary,
    pub total_complaints: usize,
    pub complaints_by_status: BTreeMap<Status, usize>,
    pub complaints_by_priority: BTreeMap<Priority, usize>,
    pub complaints_by_category: BTreeMap<String, usize>,
    pub total_feedback: usize,
    /// Rating bucket (1..=5) to count.
    pub ratings_by_bucket: BTreeMap<u8, usize>,
    pub feedback_by_category: BTreeMap<String, usize>,
    /// Mean rating; exactly 0.0 when there is no feedback.
    pub average_rating: f64,
    /// resolved / total as a raw ratio; 0.0 when there are no complaints.
    pub resolution_rate: f64,
    pub source_health: BTreeMap<SourceKind, SourceHealth>,
}

impl MetricsSnapshot {
    pub fn status_count(&self, status: Status) -> usize {
        self.complaints_by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn priority_count(&self, priority: Priority) -> usize {
        self.complaints_by_priority.get(&priority).copied().unwrap_or(0)
    }

    pub fn health(&self, kind: SourceKind) -> Option<HealthStatus> {
        self.source_health.get(&kind).map(|h| h.status)
    }

    /// Records excluded by the normalizer across all sources.
    pub fn total_skipped(&self) -> usize {
        self.source_health.values().map(|h| h.skipped).sum()
    }

    /// True when any source failed outright.
    pub fn is_degraded(&self) -> bool {
        self.source_health
            .values()
            .any(|h| h.status == HealthStatus::Failed)
    }
}

/// One ranked facility group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityScore {
    pub facility: String,
    pub building: String,
    pub mean_rating: f64,
    pub sample_count: usize,
}

/// Facilities ordered by mean rating, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityRanking(pub Vec<FacilityScore>);

impl FacilityRanking {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FacilityScore> {
        self.0.iter()
    }

    /// Fixed sample ranking a presentation layer may show when feedback is unavailable.
    ///
    /// Never produced by the engine itself; callers opt in through `ranking_available`.
    pub fn placeholder() -> Self {
        let entry = |facility: &str, building: &str, mean_rating: f64, sample_count: usize| {
            FacilityScore {
                facility: facility.to_string(),
                building: building.to_string(),
                mean_rating,
                sample_count,
            }
        };

        FacilityRanking(vec![
            entry("Library", "Main Block", 4.5, 12),
            entry("Cafeteria", "Student Center", 4.2, 20),
            entry("Computer Lab", "CS Block", 4.0, 15),
            entry("Auditorium", "Admin Block", 3.8, 8),
            entry("Sports Complex", "Sports Wing", 3.5, 10),
        ])
    }
}

/// Kind of record behind an activity item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Complaint,
    Feedback,
}

/// A summarized record for the recent-activity list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub kind: ActivityKind,
    pub id: RecordId,
    pub headline: String,
    pub detail: String,
    pub building: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Field-level normalization problem, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordIssue {
    pub source: SourceKind,
    pub index: usize,
    pub field: String,
    pub reason: String,
}

/// The complete output of one refresh cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub generation: u64,
    pub generated_at: DateTime<Utc>,
    pub snapshot: MetricsSnapshot,
    pub ranking: FacilityRanking,
    pub ranking_available: bool,
    pub recent_activity: Vec<ActivityItem>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub record_errors: Vec<RecordIssue>,
}
