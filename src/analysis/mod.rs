//! Metric aggregation, facility ranking and activity summaries.
//!
//! Everything in this module is a pure function of its input.

pub mod activity;
pub mod aggregator;
pub mod ranking;

pub use activity::recent_activity;
pub use aggregator::{aggregate, SourceOutcome};
pub use ranking::rank;
