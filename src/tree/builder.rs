//! Build the directly-rooted tree from case activity sequences.
//!
//! Each case walks down from the root, reusing the child keyed by
//! `(activity, depth)` or creating it, and folds its metrics into every node
//! it visits. Every visited node is a valid prefix state; there is no
//! rollback once a node has been updated.

use super::dimension::{Dimension, DimensionSet};
use super::node::{Drt, NodeId, TreeNode};
use crate::metrics::{even_cumulative, even_share, CaseMetrics, CaseSequence};
use crate::utils::error::DataError;
use log::debug;

/// Incremental tree builder
///
/// Owns the tree exclusively until [`TreeBuilder::finish`] hands it off.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: Drt,
    cases: usize,
}

impl TreeBuilder {
    pub fn new(dimensions: DimensionSet) -> Self {
        Self {
            tree: Drt::new(dimensions),
            cases: 0,
        }
    }

    /// Walk one case into the tree
    ///
    /// # Errors
    /// * `DataError::MissingCaseData` - the case lacks the values of an
    ///   enabled dimension; the whole build must be abandoned
    pub fn insert_case(&mut self, sequence: &CaseSequence, metrics: &CaseMetrics) -> Result<(), DataError> {
        debug_assert_eq!(sequence.case_id, metrics.case_id);

        let dimensions = *self.tree.dimensions();
        check_case(&dimensions, sequence, metrics)?;
        let mut parent = self.tree.root();

        for (position, activity) in sequence.activities.iter().enumerate() {
            let depth = position as i64;
            let node_id = self.child_or_insert(parent, activity, depth);

            let node = self.tree.node_mut(node_id);
            node.frequency += 1;
            for dimension in dimensions.iter() {
                fold_dimension(node, dimension, position, sequence, metrics)?;
            }

            parent = node_id;
        }

        self.cases += 1;
        Ok(())
    }

    /// **Private** - transition lookup, creating the state on first visit
    fn child_or_insert(&mut self, parent: NodeId, activity: &str, depth: i64) -> NodeId {
        match self.tree.find_child(parent, activity, depth) {
            Some(child) => child,
            None => self.tree.add_child(parent, activity, depth),
        }
    }

    /// Finalize the root rollup and hand the tree off
    pub fn finish(mut self) -> Drt {
        self.tree.update_root();
        debug!(
            "Built tree with {} nodes from {} cases",
            self.tree.len(),
            self.cases
        );
        self.tree
    }
}

/// Reject a case before any node is touched
///
/// **Private** - every enabled dimension needs its case scalar and, for cost
/// and time, one series entry per activity
fn check_case(dimensions: &DimensionSet, sequence: &CaseSequence, metrics: &CaseMetrics) -> Result<(), DataError> {
    let missing = |dimension| DataError::MissingCaseData {
        case_id: sequence.case_id.clone(),
        dimension,
    };
    let expected = sequence.len();
    let check_len = |dimension, found: usize| {
        if found == expected {
            Ok(())
        } else {
            Err(DataError::SeriesLength {
                case_id: sequence.case_id.clone(),
                dimension,
                expected,
                found,
            })
        }
    };

    for dimension in dimensions.iter() {
        match dimension {
            Dimension::Cost => {
                let series = sequence.cost.as_ref().ok_or_else(|| missing(dimension))?;
                metrics.cost.ok_or_else(|| missing(dimension))?;
                check_len(dimension, series.values.len().min(series.cumulative.len()))?;
            }
            Dimension::Time => {
                let series = sequence.time.as_ref().ok_or_else(|| missing(dimension))?;
                metrics.duration.ok_or_else(|| missing(dimension))?;
                let found = series
                    .service
                    .len()
                    .min(series.waiting.len())
                    .min(series.lead_cumulative.len());
                check_len(dimension, found)?;
            }
            Dimension::Rework | Dimension::Optionality => {
                metrics.numeric(dimension).ok_or_else(|| missing(dimension))?;
            }
        }
    }

    Ok(())
}

/// Fold one visit of a case into the record of one dimension
///
/// **Private** - per-dimension update rules
fn fold_dimension(
    node: &mut TreeNode,
    dimension: Dimension,
    position: usize,
    sequence: &CaseSequence,
    metrics: &CaseMetrics,
) -> Result<(), DataError> {
    let missing = || DataError::MissingCaseData {
        case_id: sequence.case_id.clone(),
        dimension,
    };

    match dimension {
        Dimension::Cost => {
            let series = sequence.cost.as_ref().ok_or_else(missing)?;
            let case_total = metrics.cost.ok_or_else(missing)?;
            if let Some(data) = node.dimensions.cost.as_mut() {
                let value = series.values[position];
                data.fold(value, case_total, series.cumulative[position], value);
            }
        }
        Dimension::Time => {
            let series = sequence.time.as_ref().ok_or_else(missing)?;
            let duration = metrics.duration.ok_or_else(missing)?;
            if let Some(data) = node.dimensions.time.as_mut() {
                data.fold(
                    series.service[position],
                    series.waiting[position],
                    duration,
                    series.lead_cumulative[position],
                );
            }
        }
        Dimension::Rework | Dimension::Optionality => {
            let case_scalar = metrics.numeric(dimension).ok_or_else(missing)?;
            let length = sequence.len();
            if let Some(data) = node.dimensions.numeric_mut(dimension) {
                data.fold(
                    even_share(case_scalar, length),
                    case_scalar,
                    even_cumulative(case_scalar, position, length),
                    case_scalar,
                );
            }
        }
    }

    Ok(())
}

/// Build a tree from aligned case sequences and metrics
///
/// **Public** - main entry point for tree building
pub fn build_tree<'a>(
    dimensions: DimensionSet,
    cases: impl IntoIterator<Item = (&'a CaseSequence, &'a CaseMetrics)>,
) -> Result<Drt, DataError> {
    let mut builder = TreeBuilder::new(dimensions);
    for (sequence, metrics) in cases {
        builder.insert_case(sequence, metrics)?;
    }
    Ok(builder.finish())
}
