//! Tour configuration domain model.

pub mod tour_config;

pub use tour_config::{TourConfig, DEFAULT_SESSION_TTL_SECS, DEFAULT_STORAGE_KEY, DEFAULT_WATCH_INTERVAL_MS};
