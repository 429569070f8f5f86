//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent a hierarchy definition that violates the tree rules.
/// They surface at construction time, never during propagation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("hierarchy has no nodes")]
    EmptyHierarchy,

    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("node {parent} references unknown child: {child}")]
    DanglingChild { parent: String, child: String },

    #[error("node {child} has more than one parent: {first}, {second}")]
    SharedChild {
        child: String,
        first: String,
        second: String,
    },

    #[error("cycle detected in hierarchy: {0}")]
    CycleDetected(String),

    #[error("hierarchy has multiple roots: {}", .0.join(", "))]
    MultipleRoots(Vec<String>),

    #[error("no initial value for node: {0}")]
    MissingValue(String),

    #[error("initial value given for unknown node: {0}")]
    UnexpectedValue(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
