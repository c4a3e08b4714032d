//! Event log model, ingestion and manual pre-grouping.
//!
//! This module handles:
//! - The in-memory log (events grouped into cases)
//! - Reading JSON row records with caller-supplied column keys
//! - Merging selected activity occurrences before discovery

pub mod grouping;
pub mod reader;
pub mod schema;

// Re-export main types
pub use grouping::group_log_activities;
pub use reader::{dimension_available, load_log, parse_timestamp_str, read_records};
pub use schema::{AttributeValue, Case, Event, EventLog};
