//! Tokio-driven target watcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use tg_core::ports::{TargetProbe, TargetWatcherError, TargetWatcherPort};

/// Polls a step's target on a fixed interval until stopped or dropped.
pub struct IntervalTargetWatcher {
    period: Duration,
    runtime: Option<Handle>,
    task: Mutex<Option<AbortHandle>>,
    last_seen: Arc<Mutex<Option<bool>>>,
    polls: Arc<AtomicU64>,
}

impl IntervalTargetWatcher {
    /// Spawns on the runtime that is current when `watch()` is called.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            runtime: None,
            task: Mutex::new(None),
            last_seen: Arc::new(Mutex::new(None)),
            polls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawns on `runtime`, for hosts that call `watch()` off the runtime.
    pub fn with_runtime(period: Duration, runtime: Handle) -> Self {
        Self {
            period,
            runtime: Some(runtime),
            task: Mutex::new(None),
            last_seen: Arc::new(Mutex::new(None)),
            polls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Result of the latest probe, `None` before the first poll.
    pub fn last_seen(&self) -> Option<bool> {
        *lock(&self.last_seen)
    }

    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }

    fn abort_current(&self) -> bool {
        match lock(&self.task).take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl TargetWatcherPort for IntervalTargetWatcher {
    fn watch(&self, step_id: &str, probe: TargetProbe) -> Result<(), TargetWatcherError> {
        let runtime = match &self.runtime {
            Some(runtime) => runtime.clone(),
            None => Handle::try_current().map_err(|_| TargetWatcherError::NoRuntime)?,
        };

        self.abort_current();
        *lock(&self.last_seen) = None;

        let period = self.period;
        let step_id = step_id.to_string();
        let last_seen = Arc::clone(&self.last_seen);
        let polls = Arc::clone(&self.polls);

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let present = probe();
                polls.fetch_add(1, Ordering::SeqCst);

                let mut seen = lock(&last_seen);
                if *seen != Some(present) {
                    if present {
                        info!(step_id = %step_id, "tour target found");
                    } else {
                        info!(step_id = %step_id, "tour target missing");
                    }
                    *seen = Some(present);
                }
            }
        });

        *lock(&self.task) = Some(task.abort_handle());
        debug!(period_ms = period.as_millis() as u64, "target watcher started");
        Ok(())
    }

    fn stop(&self) {
        if self.abort_current() {
            debug!("target watcher stopped");
        }
    }

    fn is_running(&self) -> bool {
        lock(&self.task)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for IntervalTargetWatcher {
    fn drop(&mut self) {
        self.abort_current();
    }
}
