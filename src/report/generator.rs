//! Markdown and JSON dashboard reports.
//!
//! This module renders a [`DashboardView`] for people. Rounding and
//! placeholder substitution happen here, never in the engine.

use crate::models::{
    ActivityItem, DashboardView, FacilityRanking, HealthStatus, MetricsSnapshot, Priority,
    RecordIssue, Role, SourceKind, Status,
};
use anyhow::Result;

/// Presentation choices for a report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Show the sample ranking when feedback is unavailable.
    pub placeholder_ranking: bool,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(view: &DashboardView, options: ReportOptions) -> String {
    let mut output = String::new();

    output.push_str("# Campus Dashboard\n\n");
    output.push_str(&generate_metadata_section(view));
    output.push_str(&generate_health_section(&view.snapshot));
    output.push_str(&generate_users_section(&view.snapshot));
    output.push_str(&generate_complaints_section(&view.snapshot));
    output.push_str(&generate_feedback_section(&view.snapshot));
    output.push_str(&generate_ranking_section(view, options));
    output.push_str(&generate_activity_section(&view.recent_activity));
    output.push_str(&generate_record_errors_section(&view.record_errors));

    output
}

/// Generate a JSON report.
pub fn generate_json_report(view: &DashboardView) -> Result<String> {
    serde_json::to_string_pretty(view).map_err(Into::into)
}

/// Resolution rate as a whole percentage.
pub fn resolution_percent(snapshot: &MetricsSnapshot) -> u32 {
    (snapshot.resolution_rate * 100.0).round() as u32
}

fn generate_metadata_section(view: &DashboardView) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Generation:** {}\n", view.generation));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        view.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if view.snapshot.is_degraded() {
        section.push_str("- **Status:** degraded (some sources failed)\n");
    }
    section.push('\n');

    section
}

fn health_label(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => "🟢 ok",
        HealthStatus::Partial => "🟡 partial",
        HealthStatus::Failed => "🔴 failed",
    }
}

fn generate_health_section(snapshot: &MetricsSnapshot) -> String {
    let mut section = String::new();

    section.push_str("## Source Health\n\n");
    section.push_str("| Source | Status | Records | Skipped | Error |\n");
    section.push_str("|:---|:---|:---:|:---:|:---|\n");

    for kind in SourceKind::ALL {
        if let Some(health) = snapshot.source_health.get(&kind) {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                kind,
                health_label(health.status),
                health.records,
                health.skipped,
                health.error.as_deref().unwrap_or("")
            ));
        }
    }
    section.push('\n');

    section
}

fn generate_users_section(snapshot: &MetricsSnapshot) -> String {
    let mut section = String::new();
    let users = &snapshot.users;

    section.push_str("## Users\n\n");
    section.push_str(&format!("- **Total:** {}\n", users.total));
    let parts: Vec<String> = Role::ALL
        .iter()
        .map(|role| format!("{} {}", users.count(*role), role.to_string().to_lowercase()))
        .collect();
    section.push_str(&format!("- **By role:** {}", parts.join(", ")));
    if users.approximate {
        section.push_str(" (approximate)");
    }
    section.push_str("\n\n");

    section
}

fn generate_complaints_section(snapshot: &MetricsSnapshot) -> String {
    let mut section = String::new();

    section.push_str("## Complaints\n\n");
    section.push_str(&format!("- **Total:** {}\n", snapshot.total_complaints));
    section.push_str(&format!(
        "- **Resolution rate:** {}%\n\n",
        resolution_percent(snapshot)
    ));

    section.push_str("| Status | Count |\n");
    section.push_str("|:---|:---:|\n");
    for status in Status::ALL {
        let count = snapshot.status_count(status);
        if status == Status::Unknown && count == 0 {
            continue;
        }
        section.push_str(&format!("| {} | {} |\n", status, count));
    }
    section.push('\n');

    section.push_str("| Priority | Count |\n");
    section.push_str("|:---|:---:|\n");
    for priority in Priority::ALL {
        let count = snapshot.priority_count(priority);
        if priority == Priority::Unknown && count == 0 {
            continue;
        }
        section.push_str(&format!("| {} | {} |\n", priority, count));
    }
    section.push('\n');

    if !snapshot.complaints_by_category.is_empty() {
        section.push_str("### Complaints by Category\n\n");
        section.push_str("| Category | Count |\n");
        section.push_str("|:---|:---:|\n");

        let mut categories: Vec<_> = snapshot.complaints_by_category.iter().collect();
        categories.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

        for (category, count) in categories {
            section.push_str(&format!("| {} | {} |\n", category, count));
        }
        section.push('\n');
    }

    section
}

fn generate_feedback_section(snapshot: &MetricsSnapshot) -> String {
    let mut section = String::new();

    section.push_str("## Feedback\n\n");
    section.push_str(&format!("- **Total:** {}\n", snapshot.total_feedback));
    section.push_str(&format!(
        "- **Average rating:** {:.1} ★\n\n",
        snapshot.average_rating
    ));

    section.push_str("| Rating | Count |\n");
    section.push_str("|:---|:---:|\n");
    for (rating, count) in snapshot.ratings_by_bucket.iter().rev() {
        section.push_str(&format!("| {}★ | {} |\n", rating, count));
    }
    section.push('\n');

    section
}

fn generate_ranking_section(view: &DashboardView, options: ReportOptions) -> String {
    let mut section = String::new();

    section.push_str("## Top Rated Facilities\n\n");

    let placeholder;
    let ranking: &FacilityRanking = if view.ranking_available {
        &view.ranking
    } else if options.placeholder_ranking {
        section.push_str("*Feedback is unavailable; showing sample data.*\n\n");
        placeholder = FacilityRanking::placeholder();
        &placeholder
    } else {
        section.push_str("Feedback is unavailable; no ranking for this refresh.\n\n");
        return section;
    };

    if ranking.is_empty() {
        section.push_str("No feedback has been submitted yet.\n\n");
        return section;
    }

    section.push_str("| # | Facility | Building | Rating | Reviews |\n");
    section.push_str("|:---:|:---|:---|:---:|:---:|\n");
    for (i, entry) in ranking.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {:.1} | {} |\n",
            i + 1,
            entry.facility,
            entry.building,
            entry.mean_rating,
            entry.sample_count
        ));
    }
    section.push('\n');

    section
}

fn generate_activity_section(items: &[ActivityItem]) -> String {
    let mut section = String::new();

    section.push_str("## Recent Activity\n\n");
    if items.is_empty() {
        section.push_str("No recent activity to display.\n\n");
        return section;
    }

    for item in items {
        let when = item
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "undated".to_string());
        section.push_str(&format!("- **{}** ({}, {})", item.headline, item.building, when));
        if !item.detail.is_empty() {
            section.push_str(&format!(": {}", item.detail));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_record_errors_section(errors: &[RecordIssue]) -> String {
    if errors.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Skipped Records\n\n");
    section.push_str("| Source | Record | Field | Reason |\n");
    section.push_str("|:---|:---:|:---|:---|\n");
    for issue in errors {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            issue.source, issue.index, issue.field, issue.reason
        ));
    }
    section.push('\n');

    section
}
