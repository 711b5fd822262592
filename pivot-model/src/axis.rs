//! FILENAME: pivot-model/src/axis.rs
//! Axis descriptors - the hierarchical row/column dimension model.
//!
//! An axis is described by its ordered leaf id-combinations plus a tree of
//! nodes, one per distinct (level, group) position. The tree is stored as an
//! arena addressed by `NodeId`; parent and sibling links are indices, never
//! references, so upward traversal during collapsing needs no ownership
//! cycles. `node_table[level][leaf]` maps every grid position to the node
//! active there - adjacent leaves under the same ancestor share the node id.

use serde::{Deserialize, Serialize};

use crate::key::IdCombination;

/// Index of a node in an axis arena.
pub type NodeId = usize;

/// One node of the axis tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisNode {
    /// Dimension-item id at this level.
    pub id: String,

    /// Level in the hierarchy (0 = outermost).
    pub level: usize,

    /// First leaf index covered by this node.
    pub leaf_start: usize,

    /// Number of leaves covered by this node.
    pub span: usize,

    /// Parent node at the level above.
    pub parent: Option<NodeId>,

    /// First node of this node's run. In the shared-node arena every node
    /// leads its own run, so this is the node's own id.
    pub oldest_sibling: NodeId,

    /// Position among the parent's children.
    pub sibling_position: usize,

    /// Remaining immediate children. Zero at the deepest level; decremented
    /// when a child is removed by empty hiding.
    pub children: usize,

    /// Whether the node is collapsed out of the rendered axis.
    pub collapsed: bool,

    /// Whether this node has already been handed to `reduce`. Guards the
    /// once-per-leaf decrement invariant across repeated render passes.
    pub reduced: bool,
}

/// Describes one pivot axis (rows or columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisDescriptor {
    /// Whether this axis carries any dimension. A flat layout has none.
    pub present: bool,

    /// Number of leaves (finest-grained rows/columns before aggregation).
    pub leaf_count: usize,

    /// Dimension depth (number of hierarchy levels).
    pub dims: usize,

    /// One id-combination per leaf, in axis order.
    pub leaf_ids: Vec<IdCombination>,

    /// Dimension ids, outermost first. Resolved to display names externally.
    pub dimension_names: Vec<String>,

    /// Node arena.
    pub nodes: Vec<AxisNode>,

    /// `node_table[level][leaf]` = node active at that position.
    pub node_table: Vec<Vec<NodeId>>,

    /// Leaves per node at each level; `spans[dims] == 1`.
    pub spans: Vec<usize>,

    /// Leaves per top-level-distinct group; determines subtotal spacing.
    pub unique_factor: usize,
}

impl AxisDescriptor {
    /// An absent axis: a flat layout still occupies one logical row/column.
    pub fn none() -> Self {
        AxisDescriptor {
            present: false,
            leaf_count: 1,
            dims: 0,
            leaf_ids: vec![IdCombination::new()],
            dimension_names: Vec::new(),
            nodes: Vec::new(),
            node_table: Vec::new(),
            spans: vec![1],
            unique_factor: 1,
        }
    }

    /// Builds a descriptor from per-leaf id paths, outermost id first.
    ///
    /// Consecutive leaves sharing a path prefix share the tree nodes for that
    /// prefix. All paths must have the same length; an empty path list
    /// produces an absent axis.
    pub fn from_leaf_paths<S: AsRef<str>>(
        dimension_names: Vec<String>,
        leaf_paths: &[Vec<S>],
    ) -> Self {
        if leaf_paths.is_empty() {
            return AxisDescriptor::none();
        }

        let dims = leaf_paths[0].len();
        debug_assert!(leaf_paths.iter().all(|p| p.len() == dims));
        let leaf_count = leaf_paths.len();

        let mut nodes: Vec<AxisNode> = Vec::new();
        let mut node_table: Vec<Vec<NodeId>> = vec![Vec::with_capacity(leaf_count); dims];

        // One pass per level: a new node starts wherever the path prefix up
        // to and including that level differs from the previous leaf.
        for level in 0..dims {
            let mut current: Option<NodeId> = None;
            let mut root_count = 0;

            for (leaf, path) in leaf_paths.iter().enumerate() {
                let starts_group = match current {
                    None => true,
                    Some(node) => {
                        nodes[node].id != path[level].as_ref()
                            || prefix_differs(leaf_paths, leaf, level)
                    }
                };

                if starts_group {
                    let parent = if level == 0 {
                        None
                    } else {
                        Some(node_table[level - 1][leaf])
                    };
                    let sibling_position = match parent {
                        Some(p) => nodes[p].children,
                        None => {
                            root_count += 1;
                            root_count - 1
                        }
                    };
                    let node_id = nodes.len();
                    nodes.push(AxisNode {
                        id: path[level].as_ref().to_string(),
                        level,
                        leaf_start: leaf,
                        span: 0,
                        parent,
                        oldest_sibling: node_id,
                        sibling_position,
                        children: 0,
                        collapsed: false,
                        reduced: false,
                    });
                    if let Some(p) = parent {
                        nodes[p].children += 1;
                    }
                    current = Some(node_id);
                }

                let node = current.unwrap_or_default();
                nodes[node].span += 1;
                node_table[level].push(node);
            }
        }

        // Deepest-level nodes have no children of their own; upper levels
        // already accumulated theirs while linking parents.
        let mut spans = Vec::with_capacity(dims + 1);
        for level in 0..dims {
            let distinct = distinct_count(&node_table[level]);
            spans.push(if distinct == 0 { 1 } else { leaf_count / distinct });
        }
        spans.push(1);

        let unique_factor = if dims < 2 {
            1
        } else {
            let top = distinct_count(&node_table[0]);
            if top == 0 { 1 } else { leaf_count / top }
        };

        let leaf_ids = leaf_paths
            .iter()
            .map(|path| IdCombination::from_ids(path.iter().map(|s| s.as_ref())))
            .collect();

        AxisDescriptor {
            present: true,
            leaf_count,
            dims,
            leaf_ids,
            dimension_names,
            nodes,
            node_table,
            spans,
            unique_factor,
        }
    }

    /// Node active at `(level, leaf)`.
    pub fn node_at(&self, level: usize, leaf: usize) -> Option<NodeId> {
        self.node_table.get(level).and_then(|row| row.get(leaf)).copied()
    }

    pub fn node(&self, id: NodeId) -> &AxisNode {
        &self.nodes[id]
    }

    /// Whether `leaf` is the first leaf covered by the node at `(level, leaf)`.
    pub fn is_oldest(&self, level: usize, leaf: usize) -> bool {
        self.node_at(level, leaf)
            .map(|n| self.nodes[n].leaf_start == leaf)
            .unwrap_or(false)
    }

    /// Number of distinct nodes at a level.
    pub fn level_count(&self, level: usize) -> usize {
        self.node_table
            .get(level)
            .map(|row| distinct_count(row))
            .unwrap_or(0)
    }

    /// Collapses a leaf node out of the axis and propagates the removal
    /// upward. A node with no remaining children collapses and decrements
    /// `children` on its parent's oldest sibling; the walk never descends.
    /// Calling this twice for the same leaf is a no-op - each leaf removal
    /// is counted exactly once.
    pub fn reduce(&mut self, leaf_node: NodeId) {
        if self.nodes[leaf_node].reduced {
            return;
        }
        self.nodes[leaf_node].reduced = true;

        let mut current = Some(leaf_node);
        while let Some(node) = current {
            if self.nodes[node].children == 0 {
                self.nodes[node].collapsed = true;
                if let Some(parent) = self.nodes[node].parent {
                    let counter = self.nodes[parent].oldest_sibling;
                    self.nodes[counter].children =
                        self.nodes[counter].children.saturating_sub(1);
                }
            }
            current = self.nodes[node].parent;
        }
    }
}

/// Whether the path prefix strictly above `level` changed at `leaf`.
fn prefix_differs<S: AsRef<str>>(paths: &[Vec<S>], leaf: usize, level: usize) -> bool {
    if leaf == 0 {
        return true;
    }
    (0..level).any(|l| paths[leaf][l].as_ref() != paths[leaf - 1][l].as_ref())
}

fn distinct_count(row: &[NodeId]) -> usize {
    let mut count = 0;
    let mut previous = None;
    for &node in row {
        if previous != Some(node) {
            count += 1;
            previous = Some(node);
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level_axis() -> AxisDescriptor {
        AxisDescriptor::from_leaf_paths(
            vec!["dim_a".to_string(), "dim_b".to_string()],
            &[
                vec!["A", "a1"],
                vec!["A", "a2"],
                vec!["A", "a3"],
                vec!["B", "b1"],
                vec!["B", "b2"],
                vec!["B", "b3"],
            ],
        )
    }

    #[test]
    fn test_from_leaf_paths_structure() {
        let axis = two_level_axis();

        assert!(axis.present);
        assert_eq!(axis.leaf_count, 6);
        assert_eq!(axis.dims, 2);
        assert_eq!(axis.leaf_ids[4].key(), "B-b2");

        // 2 top-level nodes + 6 leaf nodes.
        assert_eq!(axis.nodes.len(), 8);
        assert_eq!(axis.level_count(0), 2);
        assert_eq!(axis.level_count(1), 6);

        // Leaves 0..3 share the "A" node.
        let a = axis.node_at(0, 0).unwrap();
        assert_eq!(axis.node_at(0, 2), Some(a));
        assert_ne!(axis.node_at(0, 3), Some(a));
        assert_eq!(axis.node(a).span, 3);
        assert_eq!(axis.node(a).children, 3);

        assert_eq!(axis.spans, vec![3, 1, 1]);
        assert_eq!(axis.unique_factor, 3);
    }

    #[test]
    fn test_unique_factor_single_level() {
        let axis = AxisDescriptor::from_leaf_paths(
            vec!["dim".to_string()],
            &[vec!["x"], vec!["y"], vec!["z"]],
        );
        assert_eq!(axis.unique_factor, 1);
        assert_eq!(axis.dims, 1);
        assert_eq!(axis.spans, vec![1, 1]);
    }

    #[test]
    fn test_parent_links_and_oldest() {
        let axis = two_level_axis();
        let b2 = axis.node_at(1, 4).unwrap();
        let b = axis.node_at(0, 4).unwrap();
        assert_eq!(axis.node(b2).parent, Some(b));
        assert_eq!(axis.node(b2).sibling_position, 1);
        assert!(axis.is_oldest(0, 3));
        assert!(!axis.is_oldest(0, 4));
    }

    #[test]
    fn test_reduce_decrements_exactly_once() {
        let mut axis = two_level_axis();
        let a2 = axis.node_at(1, 1).unwrap();
        let a = axis.node_at(0, 1).unwrap();

        axis.reduce(a2);
        assert!(axis.node(a2).collapsed);
        assert_eq!(axis.node(a).children, 2);

        // Repeated hiding passes must not count the leaf again.
        axis.reduce(a2);
        assert_eq!(axis.node(a).children, 2);
    }

    #[test]
    fn test_reduce_collapses_emptied_branch() {
        let mut axis = two_level_axis();
        for leaf in 0..3 {
            let node = axis.node_at(1, leaf).unwrap();
            axis.reduce(node);
        }
        let a = axis.node_at(0, 0).unwrap();
        assert_eq!(axis.node(a).children, 0);
        assert!(axis.node(a).collapsed);

        // The sibling branch is untouched.
        let b = axis.node_at(0, 3).unwrap();
        assert_eq!(axis.node(b).children, 3);
        assert!(!axis.node(b).collapsed);
    }

    #[test]
    fn test_none_axis() {
        let axis = AxisDescriptor::none();
        assert!(!axis.present);
        assert_eq!(axis.leaf_count, 1);
        assert_eq!(axis.dims, 0);
        assert!(axis.leaf_ids[0].is_empty());
    }
}
