//! Dashboard assembly.
//!
//! Runs one refresh cycle: fetches the three sources concurrently, waits
//! for all of them, then normalizes, aggregates and ranks into a single
//! immutable [`DashboardView`]. Cycles are tagged with a generation
//! number; a cycle that is no longer the latest when it completes is
//! discarded rather than returned.

use crate::analysis::{aggregate, rank, recent_activity, SourceOutcome};
use crate::config::DashboardConfig;
use crate::error::{AggregationError, RefreshError, SourceFailure};
use crate::fetch::SourceFetcher;
use crate::models::{
    ComplaintRecord, DashboardView, FeedbackRecord, RawRecord, RecordIssue, SourceKind,
};
use crate::normalize::{normalize, summarize_users, Normalize, UserEntry};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Field errors kept per source in a view; the skip counters stay exact.
const MAX_RECORD_ERRORS: usize = 50;

/// Result of fetching one source.
pub type FetchResult = Result<Vec<RawRecord>, SourceFailure>;

/// Raw fetch results for one cycle. `None` marks a source that was never attempted.
#[derive(Debug, Default)]
pub struct RawSnapshot {
    pub users: Option<FetchResult>,
    pub complaints: Option<FetchResult>,
    pub feedback: Option<FetchResult>,
}

/// Bounds applied to the ranked and recent lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerSettings {
    pub top_n: usize,
    pub recent_limit: usize,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self::from(&DashboardConfig::default())
    }
}

impl From<&DashboardConfig> for AssemblerSettings {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            top_n: config.top_n,
            recent_limit: config.recent_limit,
        }
    }
}

/// Orchestrates refresh cycles and hands out one view per cycle.
#[derive(Debug, Default)]
pub struct DashboardAssembler {
    settings: AssemblerSettings,
    generation: AtomicU64,
}

impl DashboardAssembler {
    pub fn new(settings: AssemblerSettings) -> Self {
        Self {
            settings,
            generation: AtomicU64::new(0),
        }
    }

    /// Most recently issued generation.
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Invalidate every in-flight cycle. Returns the new latest generation.
    pub fn cancel(&self) -> u64 {
        let latest = self.next_generation();
        debug!("Cancelled refresh cycles up to generation {}", latest - 1);
        latest
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ensure_current(&self, generation: u64) -> Result<(), RefreshError> {
        let latest = self.latest_generation();
        if latest == generation {
            Ok(())
        } else {
            warn!(
                "Discarding refresh generation {} (latest is {})",
                generation, latest
            );
            Err(RefreshError::Superseded { generation, latest })
        }
    }

    /// Run one refresh cycle against `fetcher`.
    pub async fn refresh<F>(&self, fetcher: &F) -> Result<DashboardView, RefreshError>
    where
        F: SourceFetcher + ?Sized,
    {
        let generation = self.next_generation();
        info!("Starting refresh generation {}", generation);

        let (users, complaints, feedback) = futures::join!(
            fetcher.fetch(SourceKind::Users),
            fetcher.fetch(SourceKind::Complaints),
            fetcher.fetch(SourceKind::Feedback),
        );

        self.ensure_current(generation)?;

        let raw = RawSnapshot {
            users: Some(users),
            complaints: Some(complaints),
            feedback: Some(feedback),
        };
        let view = self.assemble(generation, &raw)?;

        self.ensure_current(generation)?;

        info!(
            "Refresh generation {} complete: {} users, {} complaints, {} feedback",
            generation,
            view.snapshot.users.total,
            view.snapshot.total_complaints,
            view.snapshot.total_feedback
        );
        Ok(view)
    }

    /// Build a view from already-fetched raw data. Pure apart from the timestamp.
    pub fn assemble(
        &self,
        generation: u64,
        raw: &RawSnapshot,
    ) -> Result<DashboardView, AggregationError> {
        let mut record_errors = Vec::new();

        let users = load::<UserEntry>(raw.users.as_ref(), &mut record_errors)
            .map(|entries| summarize_users(&entries));
        let complaints = load::<ComplaintRecord>(raw.complaints.as_ref(), &mut record_errors);
        let feedback = load::<FeedbackRecord>(raw.feedback.as_ref(), &mut record_errors);

        let snapshot = aggregate(&complaints, &feedback, &users)?;

        let complaint_records = complaints.records().map(Vec::as_slice).unwrap_or_default();
        let feedback_records = feedback.records().map(Vec::as_slice).unwrap_or_default();

        Ok(DashboardView {
            generation,
            generated_at: Utc::now(),
            ranking: rank(feedback_records, self.settings.top_n),
            ranking_available: feedback.is_loaded(),
            recent_activity: recent_activity(
                complaint_records,
                feedback_records,
                self.settings.recent_limit,
            ),
            snapshot,
            record_errors,
        })
    }
}

/// Normalize one source's fetch result into an aggregator input.
fn load<T: Normalize>(
    raw: Option<&FetchResult>,
    record_errors: &mut Vec<RecordIssue>,
) -> SourceOutcome<Vec<T>> {
    match raw {
        None => SourceOutcome::NotAttempted,
        Some(Err(failure)) => {
            warn!("{}", failure);
            SourceOutcome::failed(failure.to_string())
        }
        Some(Ok(records)) => {
            let normalized = normalize::<T>(records);
            if normalized.skipped > 0 {
                warn!(
                    "Skipped {} of {} {} records",
                    normalized.skipped,
                    records.len(),
                    T::SOURCE
                );
            }

            record_errors.extend(normalized.errors.iter().take(MAX_RECORD_ERRORS).map(|e| {
                RecordIssue {
                    source: T::SOURCE,
                    index: e.index,
                    field: e.field.to_string(),
                    reason: e.reason.clone(),
                }
            }));

            SourceOutcome::Loaded {
                records: normalized.records,
                skipped: normalized.skipped,
            }
        }
    }
}
