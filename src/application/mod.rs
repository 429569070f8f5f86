//! Application layer: engine, hosts and use cases
//!
//! This layer orchestrates domain logic and owns the mutable propagation state.

pub mod definition;
pub mod engine;
pub mod error;
pub mod error_ext;
pub mod host;
pub mod simulation;

pub use definition::{build_engine, load_definition, resolve_definition};
pub use engine::{Activation, PropagationEngine, Snapshot};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use host::{PulseHost, DEFAULT_PULSE_DELAY};
pub use simulation::SimulatedHost;
