//! Error types for the dashboard engine.
//!
//! Record-level and source-level problems are recovered locally and
//! surfaced as counters; only caller defects abort a refresh cycle.

use crate::models::SourceKind;
use thiserror::Error;

/// A single malformed field in a raw record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record {index}: field `{field}` {reason}")]
pub struct FieldError {
    /// Position of the record in the fetched batch.
    pub index: usize,
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    pub fn new(index: usize, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            index,
            field,
            reason: reason.into(),
        }
    }
}

/// A whole source could not be loaded.
#[derive(Debug, Error)]
pub enum SourceFailure {
    #[error("{source_kind} source unreachable: {message}")]
    Unreachable {
        source_kind: SourceKind,
        message: String,
    },

    #[error("{source_kind} source returned HTTP {status}")]
    Status { source_kind: SourceKind, status: u16 },

    #[error("{source_kind} source returned an unreadable payload: {message}")]
    Payload {
        source_kind: SourceKind,
        message: String,
    },
}

/// The aggregator was called without a required input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("{0} source was never attempted")]
    MissingSource(SourceKind),
}

/// Reasons a refresh cycle produced no view.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("refresh generation {generation} superseded by generation {latest}")]
    Superseded { generation: u64, latest: u64 },

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}
