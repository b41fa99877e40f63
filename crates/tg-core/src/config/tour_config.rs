use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gating::GatingMode;

/// 24 hours.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24;
/// Storage key; the `v1` suffix tracks `SESSION_SCHEMA_VERSION`.
pub const DEFAULT_STORAGE_KEY: &str = "guided_tour.session.v1";
pub const DEFAULT_WATCH_INTERVAL_MS: u64 = 500;

/// Engine configuration
///
/// Every field has a default, so a partial TOML file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourConfig {
    /// Engine-wide gating mode; steps may override it.
    pub gating_mode: GatingMode,

    /// Persisted sessions idle for longer than this are discarded on load.
    pub session_ttl_secs: u64,

    /// Key the session record is stored under.
    pub storage_key: String,

    /// Poll interval of the target watcher.
    pub watch_interval_ms: u64,
}

impl TourConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            gating_mode: GatingMode::Strict,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            watch_interval_ms: DEFAULT_WATCH_INTERVAL_MS,
        }
    }
}
