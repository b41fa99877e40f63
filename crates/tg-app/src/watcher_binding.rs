//! Keeps the host's target watcher in step with the session.

use std::sync::Arc;

use tracing::{debug, warn};

use tg_core::ports::TargetWatcherPort;
use tg_core::{StepId, StepRegistry, TourState};

use crate::target::TargetResolver;

/// Runs the watcher only while a session is active on a step with a target.
pub struct WatcherBinding {
    port: Arc<dyn TargetWatcherPort>,
    watched: Option<StepId>,
}

impl WatcherBinding {
    pub fn new(port: Arc<dyn TargetWatcherPort>) -> Self {
        Self { port, watched: None }
    }

    pub fn watched_step(&self) -> Option<&str> {
        self.watched.as_deref()
    }

    /// Start, retarget or stop the watcher for `state`.
    pub fn sync(&mut self, state: &TourState, registry: &StepRegistry, targets: &TargetResolver) {
        let wanted = state
            .current_step_id
            .as_deref()
            .filter(|_| state.is_active)
            .and_then(|id| registry.get(id))
            .and_then(|step| targets.probe(step).map(|probe| (step.id.clone(), probe)));

        let Some((step_id, probe)) = wanted else {
            self.stop();
            return;
        };

        if self.watched.as_deref() == Some(step_id.as_str()) && self.port.is_running() {
            return;
        }

        match self.port.watch(&step_id, probe) {
            Ok(()) => {
                debug!(step_id = %step_id, "target watcher attached");
                self.watched = Some(step_id);
            }
            Err(err) => {
                warn!(step_id = %step_id, error = %err, "failed to start target watcher");
                self.watched = None;
            }
        }
    }

    pub fn stop(&mut self) {
        let was_watching = self.watched.take();
        if was_watching.is_some() || self.port.is_running() {
            self.port.stop();
            debug!(step_id = ?was_watching, "target watcher stopped");
        }
    }
}
