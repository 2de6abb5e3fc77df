//! Declared alias table for every recognized raw field.
//!
//! Upstream payloads drift between `facility` and `facility_name`,
//! `building` and `building_name`, and so on. Each field lists the keys
//! it accepts in priority order; the first present, non-blank key wins.

/// A recognized field and the raw keys it may appear under.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Canonical field name, used in error reports.
    pub name: &'static str,
    /// Accepted raw keys, first match wins.
    pub aliases: &'static [&'static str],
    /// Value used when no alias is present.
    pub default: Option<&'static str>,
}

impl FieldSpec {
    const fn required(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            aliases,
            default: None,
        }
    }

    const fn with_default(
        name: &'static str,
        aliases: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            name,
            aliases,
            default: Some(default),
        }
    }
}

pub const DEFAULT_FACILITY: &str = "Unknown Facility";
pub const DEFAULT_BUILDING: &str = "Main Campus";

// Complaints
pub const COMPLAINT_ID: FieldSpec =
    FieldSpec::required("id", &["complaint_id", "id", "complaintId"]);
pub const TITLE: FieldSpec =
    FieldSpec::with_default("title", &["title", "subject", "summary"], "Untitled complaint");
pub const COMPLAINT_CATEGORY: FieldSpec =
    FieldSpec::with_default("category", &["category", "type", "complaint_type"], "general");
pub const PRIORITY: FieldSpec =
    FieldSpec::with_default("priority", &["priority", "priority_level", "severity"], "medium");
pub const STATUS: FieldSpec =
    FieldSpec::with_default("status", &["status", "state", "complaint_status"], "open");
pub const ADMIN_RESPONSE: FieldSpec =
    FieldSpec::required("admin_response", &["admin_response", "response"]);

// Shared
pub const BUILDING: FieldSpec = FieldSpec::with_default(
    "building",
    &["building_name", "building", "building_id", "location"],
    DEFAULT_BUILDING,
);
pub const CREATED_AT: FieldSpec = FieldSpec::required(
    "created_at",
    &["created_at", "createdAt", "timestamp", "submitted_at"],
);

// Feedback
pub const FEEDBACK_ID: FieldSpec =
    FieldSpec::required("id", &["feedback_id", "id", "feedbackId"]);
pub const FACILITY: FieldSpec = FieldSpec::with_default(
    "facility",
    &["facility_name", "facility", "facility_type"],
    DEFAULT_FACILITY,
);
pub const RATING: FieldSpec = FieldSpec::required("rating", &["rating", "score", "stars"]);
pub const FEEDBACK_CATEGORY: FieldSpec =
    FieldSpec::with_default("category", &["category", "type", "feedback_type"], "general");
pub const COMMENT: FieldSpec =
    FieldSpec::required("comment", &["comments", "comment", "feedback_text"]);
pub const SUBMITTER: FieldSpec = FieldSpec::with_default(
    "submitter",
    &["user_name", "submitted_by", "submitter", "user_id"],
    "Anonymous",
);

// Users
pub const ROLE: FieldSpec = FieldSpec::with_default("role", &["role", "user_role", "type"], "student");
pub const USER_TOTAL: FieldSpec = FieldSpec::required("total", &["total_users", "total"]);
pub const STUDENTS: FieldSpec = FieldSpec::required("students", &["students", "student_count"]);
pub const FACULTY_COUNT: FieldSpec = FieldSpec::required("faculty", &["faculty", "faculty_count"]);
pub const ADMINS: FieldSpec = FieldSpec::required("admins", &["admins", "admin_count"]);

/// Inclusive rating range.
pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;
