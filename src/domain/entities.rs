//! Domain entities: hierarchy definition, node values and generations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node in the hierarchy.
pub type NodeId = String;

/// Per-node state held in the value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeValue {
    /// Numeric node carrying an activation counter
    Counter(u64),
    /// Structural node without counter semantics
    Inert,
}

impl NodeValue {
    /// Value after one activation: counters step by one, inert stays inert.
    pub fn bumped(self) -> Self {
        match self {
            NodeValue::Counter(n) => NodeValue::Counter(n.saturating_add(1)),
            NodeValue::Inert => NodeValue::Inert,
        }
    }

    pub fn counter(self) -> Option<u64> {
        match self {
            NodeValue::Counter(n) => Some(n),
            NodeValue::Inert => None,
        }
    }

    pub fn is_inert(self) -> bool {
        matches!(self, NodeValue::Inert)
    }
}

impl From<Option<u64>> for NodeValue {
    fn from(value: Option<u64>) -> Self {
        value.map_or(NodeValue::Inert, NodeValue::Counter)
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Counter(n) => write!(f, "count: {n}"),
            NodeValue::Inert => write!(f, "inert"),
        }
    }
}

/// One node as supplied by the hierarchy definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    /// Display label, defaults to the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Initial counter; absent means the node is inert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
    /// Ordered child ids
    #[serde(default)]
    pub children: Vec<NodeId>,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            label: None,
            value: None,
            children: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_value(mut self, value: u64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn initial_value(&self) -> NodeValue {
        NodeValue::from(self.value)
    }
}

/// Static hierarchy definition, supplied once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyDefinition {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

impl HierarchyDefinition {
    pub fn new(nodes: Vec<NodeSpec>) -> Self {
        Self { nodes }
    }

    /// The component diagram the tool ships with.
    ///
    /// ```text
    /// app
    /// ├── counter1
    /// │   └── display1
    /// ├── counter2
    /// │   ├── display2
    /// │   └── logger
    /// └── footer
    /// ```
    pub fn builtin() -> Self {
        Self::new(vec![
            NodeSpec::new("app")
                .with_label("App")
                .with_children(["counter1", "counter2", "footer"]),
            NodeSpec::new("counter1")
                .with_label("Counter1")
                .with_value(0)
                .with_children(["display1"]),
            NodeSpec::new("counter2")
                .with_label("Counter2")
                .with_value(0)
                .with_children(["display2", "logger"]),
            NodeSpec::new("display1").with_label("Display1").with_value(0),
            NodeSpec::new("display2").with_label("Display2").with_value(0),
            NodeSpec::new("footer").with_label("Footer"),
            NodeSpec::new("logger").with_label("Logger").with_value(0),
        ])
    }

    /// Parse a definition from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Monotonic tag distinguishing successive activations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub const INITIAL: Generation = Generation(0);

    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
