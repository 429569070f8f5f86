//! Wall-clock host: the engine behind a mutex, one timer thread per activation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::application::{Activation, PropagationEngine, PulseHost, Snapshot};
use crate::domain::{Generation, HierarchyStore};

/// Host that clears pulses on real timers.
///
/// `activate` and every clear run under the same lock, so readers only ever
/// see whole activations. Timer threads sleep for the pulse delay and then
/// attempt a generation-checked clear; a timer outlived by a newer activation
/// wakes up to a no-op.
#[derive(Debug)]
pub struct ThreadedHost {
    engine: Arc<Mutex<PropagationEngine>>,
    hierarchy: Arc<HierarchyStore>,
    delay: Duration,
    timers: Vec<JoinHandle<()>>,
}

impl ThreadedHost {
    pub fn new(engine: PropagationEngine, delay: Duration) -> Self {
        let hierarchy = Arc::clone(engine.hierarchy());
        Self {
            engine: Arc::new(Mutex::new(engine)),
            hierarchy,
            delay,
            timers: Vec::new(),
        }
    }

    /// Timer threads that have not finished yet.
    pub fn pending_timers(&self) -> usize {
        self.timers.iter().filter(|t| !t.is_finished()).count()
    }

    /// Waits for every outstanding timer to fire.
    #[instrument(level = "debug", skip(self))]
    pub fn shutdown(mut self) -> Snapshot {
        for timer in self.timers.drain(..) {
            if timer.join().is_err() {
                warn!("pulse timer thread panicked");
            }
        }
        let snapshot = lock(&self.engine).snapshot();
        snapshot
    }

    fn schedule_clear(&mut self, generation: Generation) {
        self.timers.retain(|t| !t.is_finished());

        let engine = Arc::clone(&self.engine);
        let delay = self.delay;
        let spawned = thread::Builder::new()
            .name(format!("pulse-clear-{}", generation.get()))
            .spawn(move || {
                thread::sleep(delay);
                let applied = lock(&engine).clear_pulses(generation);
                debug!(%generation, applied, "pulse timer fired");
            });

        match spawned {
            Ok(handle) => self.timers.push(handle),
            // Pulses stay visible until the next activation; values are unaffected
            Err(e) => warn!(%generation, error = %e, "could not schedule pulse clear"),
        }
    }
}

impl PulseHost for ThreadedHost {
    fn activate(&mut self, id: &str) -> Option<Activation> {
        let activation = lock(&self.engine).activate(id)?;
        self.schedule_clear(activation.generation);
        Some(activation)
    }

    fn snapshot(&self) -> Snapshot {
        lock(&self.engine).snapshot()
    }

    fn hierarchy(&self) -> Arc<HierarchyStore> {
        Arc::clone(&self.hierarchy)
    }

    fn pulse_delay(&self) -> Duration {
        self.delay
    }
}

// Engine methods cannot panic halfway through a table swap, so a poisoned
// lock still guards consistent state.
fn lock(engine: &Mutex<PropagationEngine>) -> MutexGuard<'_, PropagationEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HierarchyDefinition;

    fn host(delay_ms: u64) -> ThreadedHost {
        let engine = PropagationEngine::from_definition(&HierarchyDefinition::builtin()).unwrap();
        ThreadedHost::new(engine, Duration::from_millis(delay_ms))
    }

    #[test]
    fn given_activation_when_timer_fires_then_pulses_cleared() {
        let mut host = host(10);
        host.activate("counter2").unwrap();
        assert!(host.snapshot().pulses.is_pulsing("logger"));

        let snapshot = host.shutdown();
        assert!(snapshot.pulses.is_empty());
        assert_eq!(snapshot.values.get("logger").and_then(|v| v.counter()), Some(1));
    }

    #[test]
    fn given_unknown_id_when_activating_then_no_timer() {
        let mut host = host(10);
        assert!(host.activate("ghost").is_none());
        assert_eq!(host.pending_timers(), 0);
    }
}
