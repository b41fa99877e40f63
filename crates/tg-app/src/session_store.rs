//! Session persistence with staleness expiry.
//!
//! Loading never fails: a missing, unreadable, incompatible or stale record
//! degrades to the default state. Saving never fails either; the engine's
//! in-memory state stays authoritative.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use tg_core::ports::{ClockPort, KeyValueStorePort};
use tg_core::{StepRegistry, TourConfig, TourState};

pub struct SessionStore {
    storage: Arc<dyn KeyValueStorePort>,
    clock: Arc<dyn ClockPort>,
    key: String,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(
        storage: Arc<dyn KeyValueStorePort>,
        clock: Arc<dyn ClockPort>,
        key: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            storage,
            clock,
            key: key.into(),
            ttl,
        }
    }

    pub fn from_config(
        storage: Arc<dyn KeyValueStorePort>,
        clock: Arc<dyn ClockPort>,
        config: &TourConfig,
    ) -> Self {
        Self::new(storage, clock, config.storage_key.clone(), config.session_ttl())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the persisted session, or the default state.
    ///
    /// The returned state is never active: resuming a session must not pop the
    /// tour open on page load.
    pub fn load(&self, registry: &StepRegistry) -> TourState {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "no persisted tour session");
                return TourState::default();
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read tour session, using defaults");
                return TourState::default();
            }
        };

        let mut state: TourState = match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(err) => {
                warn!(key = %self.key, error = %err, "ignoring incompatible tour session record");
                return TourState::default();
            }
        };

        if self.is_stale(&state) {
            info!(
                key = %self.key,
                last_active_at = ?state.last_active_at,
                ttl_secs = self.ttl.as_secs(),
                "discarding stale tour session"
            );
            return TourState::default();
        }

        let dropped = state.retain_registered(registry);
        if !dropped.is_empty() {
            warn!(?dropped, "tour session referenced unregistered steps");
        }

        state.is_active = false;
        debug!(current = ?state.current_step_id, "tour session restored");
        state
    }

    /// Persist `state`. Failures are logged and swallowed.
    pub fn save(&self, state: &TourState) {
        let json = match serde_json::to_string(state) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "failed to serialize tour session");
                return;
            }
        };

        if let Err(err) = self.storage.set(&self.key, &json) {
            warn!(key = %self.key, error = %err, "failed to persist tour session");
        }
    }

    /// Remove the persisted record. Failures are logged and swallowed.
    pub fn clear(&self) {
        if let Err(err) = self.storage.remove(&self.key) {
            warn!(key = %self.key, error = %err, "failed to clear tour session");
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    fn is_stale(&self, state: &TourState) -> bool {
        let Some(last_active_at) = state.last_active_at else {
            return false;
        };
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        self.clock.now_ms().saturating_sub(last_active_at) > ttl_ms
    }
}
