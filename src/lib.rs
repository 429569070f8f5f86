//! pulsetree: activation propagation over a fixed hierarchy.
//!
//! Clicking a node increments every counter in its subtree and highlights the
//! subtree for a short time. Highlights are tagged with the generation of the
//! activation that produced them, so a late timer never clears a newer one.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
