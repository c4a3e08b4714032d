//! Text rendering of discovered trees.
//!
//! This module handles:
//! - Indented node listings with per-dimension statistics
//! - Compact duration formatting for the time dimension

pub mod summary;

// Re-export main functions
pub use summary::{format_duration, generate_tree_summary, SummaryOptions};
