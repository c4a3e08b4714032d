//! Collapse maximal non-branching chains into synthetic nodes.
//!
//! A chain runs down while the current node has exactly one child visited by
//! the same cases. It stops at a node with zero or several children, or at a
//! node where some case terminates (its single child has a lower frequency).
//! A chain of two or more nodes is replaced in its parent's child list by one
//! node named `From <first> to <last>` that adopts the last node's children.
//!
//! Recombination per dimension: frequency and case totals come from the
//! first node, path-cumulative values (accumulated, remainder) from the last,
//! and totals and extrema are reduced over every member. Summing
//! `accumulated` across the chain would inflate downstream remainders.

use super::dimension::{Dimension, NodeDimensions, NumericData, TimeData};
use super::node::{Drt, NodeId, TreeNode};
use crate::utils::config::{GROUPED_NODE_PREFIX, GROUPED_NODE_SEPARATOR};
use log::debug;

/// In-place chain compaction over a finished tree
#[derive(Debug)]
pub struct TreeCompactor<'a> {
    tree: &'a mut Drt,
    merged_chains: usize,
}

impl<'a> TreeCompactor<'a> {
    pub fn new(tree: &'a mut Drt) -> Self {
        Self {
            tree,
            merged_chains: 0,
        }
    }

    /// Compact every branch below the root; returns the number of merges
    pub fn compact(mut self) -> usize {
        let mut pending: Vec<NodeId> = self.tree.root_node().children.clone();

        // Explicit stack instead of recursion; deep logs yield deep trees
        while let Some(start) = pending.pop() {
            let chain = self.collect_chain(start);
            let tail = match chain.as_slice() {
                [_, _, ..] => self.merge_chain(&chain),
                _ => start,
            };
            pending.extend(self.tree.children(tail).iter().rev().copied());
        }

        self.tree.update_root();
        self.tree.mark_grouped();
        debug!("Compaction merged {} chains", self.merged_chains);
        self.merged_chains
    }

    /// Walk down from `start` while the chain stays unbranched
    ///
    /// **Private** - the returned chain always holds at least `start`
    fn collect_chain(&self, start: NodeId) -> Vec<NodeId> {
        let mut chain = vec![start];
        let mut current = self.tree.node(start);

        while let [only] = current.children.as_slice() {
            let child = self.tree.node(*only);
            if child.frequency != current.frequency {
                break;
            }
            chain.push(*only);
            current = child;
        }

        chain
    }

    /// Replace `chain` with one synthetic node; returns the new node
    ///
    /// **Private** - chain must hold at least two linked nodes
    fn merge_chain(&mut self, chain: &[NodeId]) -> NodeId {
        let (first_id, last_id) = (chain[0], chain[chain.len() - 1]);
        let members: Vec<&TreeNode> = chain.iter().map(|&id| self.tree.node(id)).collect();
        let (first, last) = (members[0], members[members.len() - 1]);

        debug_assert!(
            members.iter().all(|n| n.frequency == first.frequency),
            "merged chain members must share one frequency"
        );
        debug_assert!(
            members.iter().all(|n| same_cases(first, n)),
            "merged chain members must be visited by the same cases"
        );

        let name = format!(
            "{} {} {} {}",
            GROUPED_NODE_PREFIX, first.name, GROUPED_NODE_SEPARATOR, last.name
        );
        let depth = first.depth;
        let frequency = first.frequency;
        let parent = first.parent;
        let children = last.children.clone();
        let dimensions = merge_dimensions(&members);

        let merged = self.tree.push_node(&name, depth, parent);
        {
            let node = self.tree.node_mut(merged);
            node.frequency = frequency;
            node.dimensions = dimensions;
            node.children = children.clone();
        }
        for child in &children {
            self.tree.node_mut(*child).parent = Some(merged);
        }
        if let Some(parent) = parent {
            for slot in self.tree.node_mut(parent).children.iter_mut() {
                if *slot == first_id {
                    *slot = merged;
                }
            }
        }
        for id in chain {
            self.tree.discard(*id);
        }

        debug!(
            "Merged {} nodes into '{}' (from node {} to node {})",
            chain.len(),
            name,
            first_id,
            last_id
        );
        self.merged_chains += 1;
        merged
    }
}

/// Recombine the records of every enabled dimension
///
/// **Private** - boundary/sum rule per dimension
fn merge_dimensions(members: &[&TreeNode]) -> NodeDimensions {
    let numeric = |dimension: Dimension| {
        let records: Option<Vec<&NumericData>> = members
            .iter()
            .map(|n| n.dimensions.numeric(dimension))
            .collect();
        records.and_then(|r| NumericData::merge_chain(&r))
    };
    let time: Option<Vec<&TimeData>> = members
        .iter()
        .map(|n| n.dimensions.time.as_ref())
        .collect();

    NodeDimensions {
        cost: numeric(Dimension::Cost),
        time: time.and_then(|r| TimeData::merge_chain(&r)),
        rework: numeric(Dimension::Rework),
        optionality: numeric(Dimension::Optionality),
    }
}

/// Whether two nodes carry identical case-level totals
///
/// **Private** - chain members are visited by the same cases in the same
/// order, so their case totals agree bit for bit
fn same_cases(a: &TreeNode, b: &TreeNode) -> bool {
    let case_totals = |n: &TreeNode| {
        (
            n.dimensions.cost.map(|d| d.total_case),
            n.dimensions.time.map(|d| d.lead_case),
            n.dimensions.rework.map(|d| d.total_case),
            n.dimensions.optionality.map(|d| d.total_case),
        )
    };
    case_totals(a) == case_totals(b)
}

/// Compact `tree` in place; returns the number of merged chains
///
/// **Public** - main entry point for compaction
pub fn compact_tree(tree: &mut Drt) -> usize {
    TreeCompactor::new(tree).compact()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::dimension::DimensionSet;

    /// Build a tree by hand: every path is one case with unit cost per step
    fn tree_from_paths(paths: &[&[&str]]) -> Drt {
        let mut builder = crate::tree::TreeBuilder::new(DimensionSet::only(&[Dimension::Cost]));
        for (i, path) in paths.iter().enumerate() {
            let len = path.len();
            let values = vec![10.0; len];
            let cumulative: Vec<f64> = (1..=len).map(|k| 10.0 * k as f64).collect();
            let sequence = crate::metrics::CaseSequence {
                case_id: i.to_string(),
                activities: path.iter().map(|s| s.to_string()).collect(),
                cost: Some(crate::metrics::CostSeries { values, cumulative }),
                time: None,
            };
            let metrics = crate::metrics::CaseMetrics {
                case_id: i.to_string(),
                duration: None,
                cost: Some(10.0 * len as f64),
                rework: None,
                optionality: None,
                unique_activities: len,
                total_activities: len,
            };
            builder.insert_case(&sequence, &metrics).unwrap();
        }
        builder.finish()
    }

    fn names(tree: &Drt) -> Vec<String> {
        tree.iter().map(|n| n.name.clone()).collect()
    }

    #[test]
    fn test_single_chain_collapses() {
        let mut tree = tree_from_paths(&[&["X", "Y", "Z"]]);
        assert_eq!(compact_tree(&mut tree), 1);

        let root = tree.root_node();
        assert_eq!(root.children.len(), 1);
        let merged = tree.node(root.children[0]);
        assert_eq!(merged.name, "From X to Z");
        assert_eq!(merged.depth, 0);
        assert_eq!(merged.frequency, 1);
        assert_eq!(merged.parent, Some(tree.root()));

        let cost = merged.dimensions.cost.unwrap();
        assert_eq!(cost.total, 30.0);
        assert_eq!(cost.total_case, 30.0);
        assert_eq!(cost.accumulated, 30.0);
        assert_eq!(cost.remainder, 0.0);
        assert_eq!(cost.min, 10.0);
        assert_eq!(cost.max, 10.0);
        assert!(tree.is_grouped());
    }

    #[test]
    fn test_branch_point_stops_chain() {
        let mut tree = tree_from_paths(&[&["A", "B", "C", "D"], &["A", "B", "E"]]);
        compact_tree(&mut tree);

        assert_eq!(
            names(&tree),
            vec!["root", "From A to B", "From C to D", "E"]
        );
        let ab = tree.node(tree.find_path(&["From A to B"]).unwrap());
        assert_eq!(ab.frequency, 2);
        assert_eq!(ab.children.len(), 2);
        for child in &ab.children {
            assert_eq!(tree.parent(*child), Some(ab.id));
        }

        let cost = ab.dimensions.cost.unwrap();
        assert_eq!(cost.total, 40.0);
        assert_eq!(cost.total_case, 70.0);
        // path-cumulative value at B, not the sum over A and B
        assert_eq!(cost.accumulated, 40.0);
        assert_eq!(cost.remainder, 30.0);
    }

    #[test]
    fn test_terminating_case_stops_chain() {
        let mut tree = tree_from_paths(&[&["A"], &["A", "B", "C"]]);
        compact_tree(&mut tree);

        assert_eq!(names(&tree), vec!["root", "A", "From B to C"]);
        let a = tree.node(tree.find_path(&["A"]).unwrap());
        assert_eq!(a.frequency, 2);
    }

    #[test]
    fn test_compaction_is_idempotent() {
        let mut tree = tree_from_paths(&[&["A", "B", "C"], &["A", "B", "D", "E"], &["F"]]);
        compact_tree(&mut tree);
        let once = names(&tree);

        assert_eq!(compact_tree(&mut tree), 0);
        assert_eq!(names(&tree), once);
    }

    #[test]
    fn test_root_rollup_after_compaction() {
        let mut tree = tree_from_paths(&[&["X", "Y"], &["Z"]]);
        compact_tree(&mut tree);

        let root = tree.root_node();
        let child_total: f64 = root
            .children
            .iter()
            .map(|&c| tree.node(c).dimensions.cost.unwrap().total)
            .sum();
        assert_eq!(root.dimensions.cost.unwrap().total, child_total);
        assert_eq!(root.frequency, 2);
    }

    /// One case X(0-2) Y(3-5) X(6-9) with time, rework and optionality
    fn timed_rework_tree() -> Drt {
        use crate::eventlog::{Event, EventLog};
        use crate::metrics::{sequence_case, CaseMetricsResolver};
        use chrono::{TimeZone, Utc};

        let at = |minute| Utc.with_ymd_and_hms(2024, 4, 1, 12, minute, 0).unwrap();
        let log = EventLog::from_events(vec![
            Event::new("1", "X", at(2)).with_start(at(0)),
            Event::new("1", "Y", at(5)).with_start(at(3)),
            Event::new("1", "X", at(9)).with_start(at(6)),
        ]);
        let dimensions = DimensionSet::only(&[Dimension::Time, Dimension::Rework, Dimension::Optionality]);
        let metrics = CaseMetricsResolver::new(&log, dimensions)
            .with_mandatory_activities(["X".to_string()].into_iter().collect())
            .resolve()
            .unwrap();
        let sequence = sequence_case(&log.cases()[0], &dimensions).unwrap();
        crate::tree::build_tree(dimensions, [(&sequence, &metrics[0])]).unwrap()
    }

    #[test]
    fn test_time_record_recombination() {
        use chrono::TimeDelta;

        let mut tree = timed_rework_tree();
        compact_tree(&mut tree);

        let merged = tree.node(tree.find_path(&["From X to X"]).unwrap());
        let time = merged.dimensions.time.unwrap();
        assert_eq!(time.service, TimeDelta::minutes(7));
        assert_eq!(time.waiting, TimeDelta::minutes(2));
        assert_eq!(time.lead, TimeDelta::minutes(9));
        assert_eq!(time.lead_case, TimeDelta::minutes(9));
        assert_eq!(time.lead_accumulated, TimeDelta::minutes(9));
        assert_eq!(time.lead_remainder, TimeDelta::zero());
        assert_eq!(time.min, TimeDelta::minutes(2));
        assert_eq!(time.max, TimeDelta::minutes(3));
    }

    #[test]
    fn test_case_scalar_records_recombination() {
        let mut tree = timed_rework_tree();
        compact_tree(&mut tree);

        let merged = tree.node(tree.find_path(&["From X to X"]).unwrap());
        assert_eq!(merged.frequency, 1);
        // rework 1 (X repeats), optionality 1 (Y beyond the mandatory set)
        for record in [merged.dimensions.rework, merged.dimensions.optionality] {
            let data = record.unwrap();
            assert_eq!(data.total, 1.0);
            assert_eq!(data.total_case, 1.0);
            assert_eq!(data.accumulated, 1.0);
            assert_eq!(data.remainder, 0.0);
            assert_eq!(data.min, 1.0);
            assert_eq!(data.max, 1.0);
        }
        assert!(merged.dimensions.cost.is_none());
    }

    #[test]
    fn test_remainders_hold_after_compaction() {
        let mut tree = tree_from_paths(&[&["A", "B", "C"], &["A", "B", "C", "D"], &["A", "E"]]);
        compact_tree(&mut tree);
        assert!(tree.iter().all(|n| n.dimensions.remainders_hold()));
    }
}
