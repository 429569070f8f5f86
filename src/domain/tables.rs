//! Value and pulse tables owned by the propagation engine.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::arena::HierarchyStore;
use crate::domain::entities::{HierarchyDefinition, NodeId, NodeValue};
use crate::domain::error::{DomainError, DomainResult};

/// Per-node counters and inert markers.
///
/// There is no setter: the only mutation is [`ValueTable::bump`], which keeps
/// every entry's shape (numeric vs inert) fixed for the table's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueTable {
    entries: BTreeMap<NodeId, NodeValue>,
}

impl ValueTable {
    pub fn from_definition(definition: &HierarchyDefinition) -> Self {
        definition
            .nodes
            .iter()
            .map(|spec| (spec.id.clone(), spec.initial_value()))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<NodeValue> {
        self.entries.get(id).copied()
    }

    /// Applies one activation to `id`, returning the new value.
    pub fn bump(&mut self, id: &str) -> Option<NodeValue> {
        let value = self.entries.get_mut(id)?;
        *value = value.bumped();
        Some(*value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeValue)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that the table has exactly one entry per hierarchy node.
    pub fn ensure_covers(&self, store: &HierarchyStore) -> DomainResult<()> {
        if let Some(missing) = store.iter().find(|(_, n)| !self.entries.contains_key(&n.data.id)) {
            return Err(DomainError::MissingValue(missing.1.data.id.clone()));
        }
        if let Some(extra) = self.entries.keys().find(|id| !store.contains(id)) {
            return Err(DomainError::UnexpectedValue(extra.clone()));
        }
        Ok(())
    }
}

impl FromIterator<(NodeId, NodeValue)> for ValueTable {
    fn from_iter<T: IntoIterator<Item = (NodeId, NodeValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Set of nodes highlighted by the most recent activation.
///
/// Absent ids read as not pulsing. A new table is built for every activation;
/// tables are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulseTable {
    pulsing: BTreeSet<NodeId>,
}

impl PulseTable {
    pub fn mark(&mut self, id: &str) {
        self.pulsing.insert(id.to_string());
    }

    pub fn is_pulsing(&self, id: &str) -> bool {
        self.pulsing.contains(id)
    }

    /// An edge pulses iff both of its endpoints pulse.
    pub fn is_edge_pulsing(&self, parent: &str, child: &str) -> bool {
        self.is_pulsing(parent) && self.is_pulsing(child)
    }

    /// Derived pulse state of every edge in `store`.
    pub fn edge_pulses(&self, store: &HierarchyStore) -> Vec<EdgePulse> {
        store
            .edges()
            .into_iter()
            .map(|(parent, child)| EdgePulse {
                parent: parent.to_string(),
                child: child.to_string(),
                pulsing: self.is_edge_pulsing(parent, child),
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.pulsing.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pulsing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulsing.is_empty()
    }
}

/// Pulse state of a single (parent, child) edge, derived from a [`PulseTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePulse {
    pub parent: NodeId,
    pub child: NodeId,
    pub pulsing: bool,
}
