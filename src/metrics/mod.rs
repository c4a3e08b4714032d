//! Case-level metrics and per-case activity sequences.
//!
//! This module transforms the event log into:
//! - Case scalars (duration, cost, rework, optionality)
//! - Ordered activity sequences with service/waiting times and prefix sums

pub mod case_metrics;
pub mod sequencer;

// Re-export main types and functions
pub use case_metrics::{mandatory_activities, optional_activities, CaseMetrics, CaseMetricsResolver};
pub use sequencer::{even_cumulative, even_share, sequence_case, CaseSequence, CostSeries, TimeSeries};
