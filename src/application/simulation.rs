//! Deterministic host driven by a virtual clock.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::application::engine::{Activation, PropagationEngine, Snapshot};
use crate::application::host::PulseHost;
use crate::domain::{Generation, HierarchyStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PendingClear {
    due: Duration,
    generation: Generation,
}

/// Runs the engine against simulated time.
///
/// Activations schedule clears on an internal queue; nothing fires until
/// [`SimulatedHost::advance`] moves the clock past their due time.
#[derive(Debug)]
pub struct SimulatedHost {
    engine: PropagationEngine,
    delay: Duration,
    now: Duration,
    pending: BinaryHeap<Reverse<PendingClear>>,
}

impl SimulatedHost {
    pub fn new(engine: PropagationEngine, delay: Duration) -> Self {
        Self {
            engine,
            delay,
            now: Duration::ZERO,
            pending: BinaryHeap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of scheduled clears that have not fired yet, stale ones included.
    pub fn pending_clears(&self) -> usize {
        self.pending.len()
    }

    pub fn engine(&self) -> &PropagationEngine {
        &self.engine
    }

    /// Moves the clock forward by `by` and fires every clear now due, oldest
    /// first. Returns how many of them actually cleared pulses.
    #[instrument(level = "debug", skip(self))]
    pub fn advance(&mut self, by: Duration) -> usize {
        self.now += by;
        let mut applied = 0;
        while let Some(Reverse(next)) = self.pending.peek().copied() {
            if next.due > self.now {
                break;
            }
            self.pending.pop();
            if self.engine.clear_pulses(next.generation) {
                applied += 1;
            }
        }
        debug!(now = ?self.now, applied, pending = self.pending.len(), "clock advanced");
        applied
    }
}

impl PulseHost for SimulatedHost {
    fn activate(&mut self, id: &str) -> Option<Activation> {
        let activation = self.engine.activate(id)?;
        self.pending.push(Reverse(PendingClear {
            due: self.now + self.delay,
            generation: activation.generation,
        }));
        Some(activation)
    }

    fn snapshot(&self) -> Snapshot {
        self.engine.snapshot()
    }

    fn hierarchy(&self) -> Arc<HierarchyStore> {
        Arc::clone(self.engine.hierarchy())
    }

    fn pulse_delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::host::DEFAULT_PULSE_DELAY;
    use crate::domain::HierarchyDefinition;

    fn host() -> SimulatedHost {
        let engine = PropagationEngine::from_definition(&HierarchyDefinition::builtin()).unwrap();
        SimulatedHost::new(engine, DEFAULT_PULSE_DELAY)
    }

    #[test]
    fn given_activation_when_delay_not_reached_then_still_pulsing() {
        let mut host = host();
        host.activate("counter1").unwrap();

        assert_eq!(host.advance(Duration::from_millis(599)), 0);
        assert!(host.snapshot().pulses.is_pulsing("display1"));

        assert_eq!(host.advance(Duration::from_millis(1)), 1);
        assert!(host.snapshot().pulses.is_empty());
        assert_eq!(host.pending_clears(), 0);
    }

    #[test]
    fn given_unknown_id_when_activating_then_nothing_scheduled() {
        let mut host = host();
        assert!(host.activate("ghost").is_none());
        assert_eq!(host.pending_clears(), 0);
    }

    #[test]
    fn given_superseded_activation_when_old_clear_fires_then_new_pulses_remain() {
        let mut host = host();
        host.activate("counter1").unwrap();
        host.advance(Duration::from_millis(400));
        host.activate("counter2").unwrap();

        // first clear due at 600, second at 1000
        assert_eq!(host.advance(Duration::from_millis(300)), 0);
        assert!(host.snapshot().pulses.is_pulsing("counter2"));
        assert!(!host.snapshot().pulses.is_pulsing("counter1"));

        assert_eq!(host.advance(Duration::from_millis(300)), 1);
        assert!(host.snapshot().pulses.is_empty());
        assert_eq!(host.now(), Duration::from_millis(1000));
    }
}
