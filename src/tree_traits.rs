//! Text rendering of a hierarchy snapshot as a `termtree` tree.

use colored::Colorize;
use generational_arena::Index;
use termtree::Tree;

use crate::application::Snapshot;
use crate::domain::HierarchyStore;

pub trait TreeNodeConvert {
    /// Renders the hierarchy with node values and pulse markers from `snapshot`.
    fn to_tree_string(&self, snapshot: &Snapshot) -> Tree<String>;
}

impl TreeNodeConvert for HierarchyStore {
    fn to_tree_string(&self, snapshot: &Snapshot) -> Tree<String> {
        let Some(root_idx) = self.root() else {
            return Tree::new("Empty hierarchy".to_string());
        };

        fn build_tree(store: &HierarchyStore, snapshot: &Snapshot, node_idx: Index) -> Tree<String> {
            let Some(node) = store.node(node_idx) else {
                return Tree::new(String::new());
            };
            let leaves: Vec<_> = node
                .children
                .iter()
                .map(|&child| build_tree(store, snapshot, child))
                .collect();
            Tree::new(node_line(&node.data.id, &node.data.label, snapshot)).with_leaves(leaves)
        }

        build_tree(self, snapshot, root_idx)
    }
}

/// `Label [id] count: N`, highlighted with a trailing `*` while pulsing.
pub fn node_line(id: &str, label: &str, snapshot: &Snapshot) -> String {
    let mut line = if label == id {
        label.to_string()
    } else {
        format!("{label} [{id}]")
    };
    if let Some(count) = snapshot.values.get(id).and_then(|v| v.counter()) {
        line.push_str(&format!(" count: {count}"));
    }
    if snapshot.pulses.is_pulsing(id) {
        format!("{} {}", line.yellow().bold(), "*".yellow())
    } else {
        line
    }
}

/// Pulsing edges as `parent -> child`, in hierarchy order.
pub fn pulsing_edges(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .edges
        .iter()
        .filter(|edge| edge.pulsing)
        .map(|edge| format!("{} -> {}", edge.parent, edge.child))
        .collect()
}
