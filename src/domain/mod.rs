//! Domain layer: hierarchy, tables and their rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod tables;

pub use arena::{HierarchyStore, NodeData, TreeIterator, TreeNode};
pub use builder::HierarchyBuilder;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use tables::{EdgePulse, PulseTable, ValueTable};
