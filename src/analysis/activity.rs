//! Recent-activity feed.
//!
//! Merges complaints and feedback into one list of summarized items,
//! newest first.

use crate::models::{ActivityItem, ActivityKind, ComplaintRecord, FeedbackRecord, Status};

/// The `limit` most recent items across complaints and feedback.
///
/// Records without a timestamp sort after all dated records.
pub fn recent_activity(
    complaints: &[ComplaintRecord],
    feedback: &[FeedbackRecord],
    limit: usize,
) -> Vec<ActivityItem> {
    if limit == 0 {
        return Vec::new();
    }

    let mut items: Vec<ActivityItem> = complaints
        .iter()
        .map(complaint_item)
        .chain(feedback.iter().map(feedback_item))
        .collect();

    items.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.id.cmp(&b.id))
    });
    items.truncate(limit);
    items
}

fn complaint_item(complaint: &ComplaintRecord) -> ActivityItem {
    let headline = match complaint.status {
        Status::Resolved => "Complaint resolved",
        Status::Closed => "Complaint closed",
        Status::InProgress => "Complaint in progress",
        _ => "New complaint submitted",
    };

    ActivityItem {
        kind: ActivityKind::Complaint,
        id: complaint.id.clone(),
        headline: headline.to_string(),
        detail: complaint.title.clone(),
        building: complaint.building.clone(),
        created_at: complaint.created_at,
    }
}

fn feedback_item(entry: &FeedbackRecord) -> ActivityItem {
    ActivityItem {
        kind: ActivityKind::Feedback,
        id: entry.id.clone(),
        headline: format!("{}★ feedback for {}", entry.rating, entry.facility),
        detail: entry.comment.clone().unwrap_or_default(),
        building: entry.building.clone(),
        created_at: entry.created_at,
    }
}
