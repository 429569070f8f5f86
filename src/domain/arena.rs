//! Arena-backed hierarchy store with id lookup and pre-order traversal.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::NodeId;

/// Data payload for hierarchy nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Unique node id
    pub id: NodeId,
    /// Display label, opaque to propagation
    pub label: String,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    /// Identity and label of this node
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in definition order
    pub children: Vec<Index>,
}

/// Arena-based, read-only store of the rooted hierarchy.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Instances are only produced by [`crate::domain::HierarchyBuilder`], which
/// guarantees a single rooted tree; nothing mutates the store afterwards.
#[derive(Debug)]
pub struct HierarchyStore {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Index of the root node, None for empty stores
    root: Option<Index>,
    /// Id lookup
    ids: HashMap<NodeId, Index>,
}

impl HierarchyStore {
    pub(crate) fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            ids: HashMap::new(),
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub(crate) fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let id = data.id.clone();
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);
        self.ids.insert(id, node_idx);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn index_of(&self, id: &str) -> Option<Index> {
        self.ids.get(id).copied()
    }

    pub fn node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    /// Looks up a node by id; unknown ids yield `None`.
    pub fn get_node(&self, id: &str) -> Option<&TreeNode> {
        self.index_of(id).and_then(|idx| self.node(idx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Ordered child ids of `id`; empty for leaves and unknown ids.
    pub fn children(&self, id: &str) -> Vec<&str> {
        self.get_node(id)
            .map(|node| self.ids_of(&node.children))
            .unwrap_or_default()
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.get_node(id)
            .and_then(|node| node.parent)
            .and_then(|idx| self.node(idx))
            .map(|node| node.data.id.as_str())
    }

    pub fn all_node_ids(&self) -> BTreeSet<&str> {
        self.ids.keys().map(String::as_str).collect()
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root
            .and_then(|idx| self.node(idx))
            .map(|node| node.data.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order walk of the whole hierarchy.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.root)
    }

    /// Pre-order walk of the subtree rooted at `start`, `start` first.
    pub fn iter_from(&self, start: Index) -> TreeIterator<'_> {
        TreeIterator::new(self, Some(start))
    }

    /// Ids of `id` and all of its descendants in pre-order.
    #[instrument(level = "trace", skip(self))]
    pub fn subtree_ids(&self, id: &str) -> Vec<&str> {
        match self.index_of(id) {
            Some(idx) => self
                .iter_from(idx)
                .map(|(_, node)| node.data.id.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// All (parent, child) edges in pre-order of the parent.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges = Vec::new();
        for (_, node) in self.iter() {
            for child_id in self.ids_of(&node.children) {
                edges.push((node.data.id.as_str(), child_id));
            }
        }
        edges
    }

    pub fn has_edge(&self, parent: &str, child: &str) -> bool {
        self.parent(child) == Some(parent)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    fn ids_of(&self, indices: &[Index]) -> Vec<&str> {
        indices
            .iter()
            .filter_map(|&idx| self.node(idx))
            .map(|node| node.data.id.as_str())
            .collect()
    }
}

pub struct TreeIterator<'a> {
    store: &'a HierarchyStore,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(store: &'a HierarchyStore, start: Option<Index>) -> Self {
        let mut stack = Vec::new();
        if let Some(start) = start {
            stack.push(start);
        }
        Self { store, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.store.node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
