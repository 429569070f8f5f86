//! Host boundary: an engine plus the timer that clears its pulses.

use std::sync::Arc;
use std::time::Duration;

use crate::application::engine::{Activation, Snapshot};
use crate::domain::HierarchyStore;

/// Pulse duration of the reference diagram.
pub const DEFAULT_PULSE_DELAY: Duration = Duration::from_millis(600);

/// A propagation engine wired to a scheduling primitive.
///
/// Implementations schedule one pulse clear per successful activation, tagged
/// with that activation's generation.
pub trait PulseHost {
    /// Activates `id`; unknown ids are a no-op and schedule nothing.
    fn activate(&mut self, id: &str) -> Option<Activation>;

    /// Current state of the engine.
    fn snapshot(&self) -> Snapshot;

    /// The static hierarchy the engine runs over.
    fn hierarchy(&self) -> Arc<HierarchyStore>;

    /// Delay between an activation and its pulse clear.
    fn pulse_delay(&self) -> Duration;
}
