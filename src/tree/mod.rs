//! Multi-dimensional directly-rooted tree.
//!
//! This module provides:
//! - The node arena and its accessors
//! - Per-dimension statistics records
//! - Tree construction from case sequences
//! - Chain compaction into grouped nodes
//! - The discovery pipeline tying the stages together

pub mod builder;
pub mod compactor;
pub mod dimension;
pub mod discover;
pub mod node;

// Re-export main types and functions
pub use builder::{build_tree, TreeBuilder};
pub use compactor::{compact_tree, TreeCompactor};
pub use dimension::{Dimension, DimensionData, DimensionSet, NodeDimensions, NumericData, TimeData};
pub use discover::discover_multi_dimensional_drt;
pub use node::{Drt, NodeId, PreOrder, TreeNode, ROOT_DEPTH};
