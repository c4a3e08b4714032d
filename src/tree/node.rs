//! Arena-backed directly-rooted tree.
//!
//! Nodes live in a `Vec` indexed by `NodeId`; children are index lists and
//! the parent is an optional index. Compaction detaches replaced nodes by
//! clearing their slot, so ids of surviving nodes never move.

use super::dimension::{
    Dimension, DimensionData, DimensionSet, NodeDimensions, NumericData, TimeData,
};
use std::fmt;

/// Stable node identifier (arena slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Depth of the synthetic root
pub const ROOT_DEPTH: i64 = -1;

/// A unique position `(parent, activity, depth)` in the case sequences
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: String,
    /// Position in the activity sequence; the root sits at -1
    pub depth: i64,
    /// Number of cases whose walk passed through this node
    pub frequency: u64,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub dimensions: NodeDimensions,
}

impl TreeNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn data(&self, dimension: Dimension) -> Option<DimensionData<'_>> {
        self.dimensions.get(dimension)
    }
}

/// Multi-dimensional directly-rooted tree
#[derive(Debug, Clone)]
pub struct Drt {
    nodes: Vec<Option<TreeNode>>,
    root: NodeId,
    dimensions: DimensionSet,
    grouped: bool,
}

impl Drt {
    /// Create a tree holding only the synthetic root
    pub fn new(dimensions: DimensionSet) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            dimensions,
            grouped: false,
        };
        tree.root = tree.push_node("root", ROOT_DEPTH, None);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &TreeNode {
        self.node(self.root)
    }

    pub fn dimensions(&self) -> &DimensionSet {
        &self.dimensions
    }

    /// Whether chain compaction has been applied
    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    pub(crate) fn mark_grouped(&mut self) {
        self.grouped = true;
    }

    /// Get a node that is part of the tree
    ///
    /// # Panics
    /// If `id` was never issued by this tree or was discarded by compaction,
    /// the same contract as slice indexing.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        match self.get(id) {
            Some(node) => node,
            None => panic!("node {} is not part of this tree", id),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("node {} is not part of this tree", id),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Number of nodes reachable from the root, root included
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.root_node().is_leaf()
    }

    /// Pre-order traversal over reachable nodes
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![self.root],
        }
    }

    /// Child of `parent` with the given activity name and depth
    pub fn find_child(&self, parent: NodeId, name: &str, depth: i64) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| {
                let node = self.node(child);
                node.name == name && node.depth == depth
            })
    }

    /// Follow a sequence of node names from the root
    pub fn find_path(&self, names: &[&str]) -> Option<NodeId> {
        names.iter().try_fold(self.root, |current, name| {
            self.children(current)
                .iter()
                .copied()
                .find(|&child| self.node(child).name == *name)
        })
    }

    /// Deepest node depth, or -1 for a tree holding only the root
    pub fn max_depth(&self) -> i64 {
        self.iter().map(|n| n.depth).max().unwrap_or(ROOT_DEPTH)
    }

    /// Append a child under `parent`
    pub(crate) fn add_child(&mut self, parent: NodeId, name: &str, depth: i64) -> NodeId {
        let child = self.push_node(name, depth, Some(parent));
        self.node_mut(parent).children.push(child);
        child
    }

    /// Allocate a detached node with empty statistics
    pub(crate) fn push_node(&mut self, name: &str, depth: i64, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(TreeNode {
            id,
            name: name.to_string(),
            depth,
            frequency: 0,
            parent,
            children: Vec::new(),
            dimensions: NodeDimensions::new(&self.dimensions),
        }));
        id
    }

    /// Drop a node from the arena; its slot stays empty
    pub(crate) fn discard(&mut self, id: NodeId) -> Option<TreeNode> {
        self.nodes.get_mut(id.0).and_then(Option::take)
    }

    /// Recompute the root statistics from its direct children
    pub(crate) fn update_root(&mut self) {
        let root = self.root_node();
        let children: Vec<&TreeNode> = root.children.iter().map(|&c| self.node(c)).collect();

        let frequency: u64 = children.iter().map(|c| c.frequency).sum();
        let dimensions = NodeDimensions {
            cost: self
                .dimensions
                .cost
                .then(|| rollup_numeric(&children, Dimension::Cost)),
            time: self.dimensions.time.then(|| {
                TimeData::rollup(
                    children.iter().filter_map(|c| c.dimensions.time.as_ref()),
                )
            }),
            rework: self
                .dimensions
                .rework
                .then(|| rollup_numeric(&children, Dimension::Rework)),
            optionality: self
                .dimensions
                .optionality
                .then(|| rollup_numeric(&children, Dimension::Optionality)),
        };

        let root_id = self.root;
        let root = self.node_mut(root_id);
        root.frequency = frequency;
        root.dimensions = dimensions;
    }
}

fn rollup_numeric(children: &[&TreeNode], dimension: Dimension) -> NumericData {
    NumericData::rollup(
        children
            .iter()
            .filter_map(|c| c.dimensions.numeric(dimension)),
    )
}

/// Iterator returned by [`Drt::iter`]
pub struct PreOrder<'a> {
    tree: &'a Drt,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        self.stack.extend(node.children.iter().rev().copied());
        Some(node)
    }
}
