//! Tour session domain module.

pub mod state;

pub use state::{TourState, UserLevel, SESSION_SCHEMA_VERSION};
