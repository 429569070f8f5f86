//! Hierarchy builder: validates a definition and constructs the arena store.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::domain::arena::{HierarchyStore, NodeData};
use crate::domain::entities::{HierarchyDefinition, NodeId};
use crate::domain::error::{DomainError, DomainResult};

/// Constructs a [`HierarchyStore`] from a definition, failing fast on anything
/// that is not a single rooted tree.
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    relationship_cache: HashMap<NodeId, Vec<NodeId>>,
    parent_of: HashMap<NodeId, NodeId>,
    labels: HashMap<NodeId, String>,
    declared: Vec<NodeId>,
    visited: HashSet<NodeId>,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "debug", skip(self, definition), fields(nodes = definition.nodes.len()))]
    pub fn build(&mut self, definition: &HierarchyDefinition) -> DomainResult<HierarchyStore> {
        // Reset state for a fresh build
        self.relationship_cache.clear();
        self.parent_of.clear();
        self.labels.clear();
        self.declared.clear();
        self.visited.clear();

        if definition.nodes.is_empty() {
            return Err(DomainError::EmptyHierarchy);
        }

        self.scan_definition(definition)?;
        self.link_children()?;

        let roots = self.find_root_nodes();
        let root = match roots.as_slice() {
            // Every node has a parent: the parent chain must loop somewhere
            [] => return Err(DomainError::CycleDetected(self.declared[0].clone())),
            [root] => root.clone(),
            _ => return Err(DomainError::MultipleRoots(roots.clone())),
        };

        let store = self.build_tree(&root)?;

        // Nodes off the root's tree can only sit on a detached cycle
        if let Some(unreached) = self.declared.iter().find(|id| !self.visited.contains(*id)) {
            return Err(DomainError::CycleDetected(unreached.clone()));
        }

        debug!(root = %root, nodes = store.len(), depth = store.depth(), "hierarchy built");
        Ok(store)
    }

    fn scan_definition(&mut self, definition: &HierarchyDefinition) -> DomainResult<()> {
        for spec in &definition.nodes {
            if self.labels.contains_key(&spec.id) {
                return Err(DomainError::DuplicateNode(spec.id.clone()));
            }
            let label = spec.label.clone().unwrap_or_else(|| spec.id.clone());
            self.labels.insert(spec.id.clone(), label);
            self.declared.push(spec.id.clone());
            self.relationship_cache
                .insert(spec.id.clone(), spec.children.clone());
        }
        Ok(())
    }

    fn link_children(&mut self) -> DomainResult<()> {
        for parent in &self.declared {
            let children = self
                .relationship_cache
                .get(parent)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for child in children {
                if !self.labels.contains_key(child) {
                    return Err(DomainError::DanglingChild {
                        parent: parent.clone(),
                        child: child.clone(),
                    });
                }
                if child == parent {
                    return Err(DomainError::CycleDetected(child.clone()));
                }
                if let Some(first) = self.parent_of.get(child) {
                    return Err(DomainError::SharedChild {
                        child: child.clone(),
                        first: first.clone(),
                        second: parent.clone(),
                    });
                }
                self.parent_of.insert(child.clone(), parent.clone());
            }
        }
        Ok(())
    }

    fn find_root_nodes(&self) -> Vec<NodeId> {
        self.declared
            .iter()
            .filter(|id| !self.parent_of.contains_key(*id))
            .cloned()
            .collect()
    }

    fn build_tree(&mut self, root: &str) -> DomainResult<HierarchyStore> {
        let mut store = HierarchyStore::new();
        let mut stack = vec![(root.to_string(), None)];

        while let Some((current, parent_idx)) = stack.pop() {
            if !self.visited.insert(current.clone()) {
                return Err(DomainError::CycleDetected(current));
            }

            let label = self
                .labels
                .get(&current)
                .cloned()
                .unwrap_or_else(|| current.clone());
            let current_idx = store.insert_node(
                NodeData {
                    id: current.clone(),
                    label,
                },
                parent_idx,
            );

            // Reverse push keeps definition order when popping
            if let Some(children) = self.relationship_cache.get(&current) {
                for child in children.iter().rev() {
                    stack.push((child.clone(), Some(current_idx)));
                }
            }
        }

        Ok(store)
    }
}
