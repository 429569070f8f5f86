//! Infrastructure layer: wall-clock scheduling
//!
//! This layer provides the real-time host used by the interactive CLI.

pub mod timer;

pub use timer::ThreadedHost;
