//! Propagation engine: activation traversal and generation-tagged pulses.

use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::domain::{
    DomainResult, EdgePulse, Generation, HierarchyBuilder, HierarchyDefinition, HierarchyStore,
    NodeId, PulseTable, ValueTable,
};

/// Outcome of an activation that hit a known node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Generation the published pulse table belongs to
    pub generation: Generation,
    /// Visited nodes in pre-order, the activated node first
    pub visited: Vec<NodeId>,
}

/// Immutable copy of the engine state, safe to hand to readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub generation: Generation,
    pub values: ValueTable,
    pub pulses: PulseTable,
    pub edges: Vec<EdgePulse>,
}

/// Owns the value and pulse tables and applies activations to them.
///
/// All mutation goes through `&mut self`, so a caller never observes a
/// half-applied activation. Pulse clears are tagged with the generation they
/// were scheduled for and ignored once a newer activation has published.
#[derive(Debug)]
pub struct PropagationEngine {
    hierarchy: Arc<HierarchyStore>,
    values: ValueTable,
    pulses: PulseTable,
    generation: Generation,
}

impl PropagationEngine {
    /// Creates an engine over `hierarchy`, seeded with `values`.
    ///
    /// Fails if `values` does not hold exactly one entry per hierarchy node.
    pub fn new(hierarchy: Arc<HierarchyStore>, values: ValueTable) -> DomainResult<Self> {
        values.ensure_covers(&hierarchy)?;
        Ok(Self {
            hierarchy,
            values,
            pulses: PulseTable::default(),
            generation: Generation::INITIAL,
        })
    }

    /// Validates `definition` and seeds the value table from it.
    pub fn from_definition(definition: &HierarchyDefinition) -> DomainResult<Self> {
        let hierarchy = HierarchyBuilder::new().build(definition)?;
        Self::new(Arc::new(hierarchy), ValueTable::from_definition(definition))
    }

    /// Propagates an activation from `id` through its subtree.
    ///
    /// Every visited node pulses in a freshly built pulse table and every
    /// numeric counter in the subtree, `id` included, goes up by one. Unknown
    /// ids change nothing and return `None`.
    #[instrument(level = "debug", skip(self))]
    pub fn activate(&mut self, id: &str) -> Option<Activation> {
        let Some(start) = self.hierarchy.index_of(id) else {
            debug!("ignoring activation of unknown node");
            return None;
        };

        let mut values = self.values.clone();
        let mut pulses = PulseTable::default();
        let mut visited = Vec::new();

        for (_, node) in self.hierarchy.iter_from(start) {
            let node_id = node.data.id.as_str();
            pulses.mark(node_id);
            let value = values.bump(node_id);
            trace!(node = node_id, ?value, "visited");
            visited.push(node_id.to_string());
        }

        self.generation = self.generation.next();
        self.values = values;
        self.pulses = pulses;

        debug!(generation = %self.generation, visited = visited.len(), "activation published");
        Some(Activation {
            generation: self.generation,
            visited,
        })
    }

    /// Clears the pulse table if `generation` is still the current one.
    ///
    /// Returns whether the clear took effect. A clear scheduled by an earlier,
    /// superseded activation is a no-op.
    #[instrument(level = "debug", skip(self))]
    pub fn clear_pulses(&mut self, generation: Generation) -> bool {
        if generation != self.generation {
            debug!(current = %self.generation, "stale pulse clear ignored");
            return false;
        }
        self.pulses = PulseTable::default();
        true
    }

    pub fn hierarchy(&self) -> &Arc<HierarchyStore> {
        &self.hierarchy
    }

    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    pub fn pulses(&self) -> &PulseTable {
        &self.pulses
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn edge_pulses(&self) -> Vec<EdgePulse> {
        self.pulses.edge_pulses(&self.hierarchy)
    }

    /// Whether the edge (parent, child) exists and both ends pulse.
    pub fn is_edge_pulsing(&self, parent: &str, child: &str) -> bool {
        self.hierarchy.has_edge(parent, child) && self.pulses.is_edge_pulsing(parent, child)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            generation: self.generation,
            values: self.values.clone(),
            pulses: self.pulses.clone(),
            edges: self.edge_pulses(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, NodeSpec, NodeValue};

    // root (inert) -> {a: 0, b: 0}
    fn small() -> PropagationEngine {
        PropagationEngine::from_definition(&HierarchyDefinition::new(vec![
            NodeSpec::new("root").with_children(["a", "b"]),
            NodeSpec::new("a").with_value(0),
            NodeSpec::new("b").with_value(0),
        ]))
        .unwrap()
    }

    #[test]
    fn given_root_when_activating_then_all_counters_step_and_all_pulse() {
        let mut engine = small();
        let activation = engine.activate("root").unwrap();

        assert_eq!(activation.visited, vec!["root", "a", "b"]);
        assert_eq!(activation.generation.get(), 1);
        assert_eq!(engine.values().get("root"), Some(NodeValue::Inert));
        assert_eq!(engine.values().get("a"), Some(NodeValue::Counter(1)));
        assert_eq!(engine.values().get("b"), Some(NodeValue::Counter(1)));
        assert!(["root", "a", "b"].iter().all(|id| engine.pulses().is_pulsing(id)));
        assert!(engine.is_edge_pulsing("root", "a"));
    }

    #[test]
    fn given_leaf_when_activating_then_only_leaf_changes() {
        let mut engine = small();
        engine.activate("a").unwrap();

        assert_eq!(engine.values().get("a"), Some(NodeValue::Counter(1)));
        assert_eq!(engine.values().get("b"), Some(NodeValue::Counter(0)));
        assert!(engine.pulses().is_pulsing("a"));
        assert!(!engine.pulses().is_pulsing("root"));
        assert!(!engine.pulses().is_pulsing("b"));
        assert!(!engine.is_edge_pulsing("root", "a"));
    }

    #[test]
    fn given_unknown_id_when_activating_then_nothing_changes() {
        let mut engine = small();
        engine.activate("root");
        let before = engine.snapshot();

        assert_eq!(engine.activate("does-not-exist"), None);
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn given_previous_pulses_when_activating_then_table_is_replaced() {
        let mut engine = small();
        engine.activate("a");
        engine.activate("b");

        assert!(!engine.pulses().is_pulsing("a"));
        assert!(engine.pulses().is_pulsing("b"));
        assert_eq!(engine.pulses().len(), 1);
    }

    #[test]
    fn given_stale_generation_when_clearing_then_current_pulses_survive() {
        let mut engine = small();
        let first = engine.activate("a").unwrap();
        let second = engine.activate("b").unwrap();

        assert!(!engine.clear_pulses(first.generation));
        assert!(engine.pulses().is_pulsing("b"));

        assert!(engine.clear_pulses(second.generation));
        assert!(engine.pulses().is_empty());
        assert_eq!(engine.values().get("b"), Some(NodeValue::Counter(1)));
    }

    #[test]
    fn given_values_not_covering_hierarchy_when_creating_then_errors() {
        let definition = HierarchyDefinition::builtin();
        let hierarchy = Arc::new(HierarchyBuilder::new().build(&definition).unwrap());
        let result = PropagationEngine::new(hierarchy, ValueTable::default());
        assert!(matches!(result.unwrap_err(), DomainError::MissingValue(_)));
    }
}
