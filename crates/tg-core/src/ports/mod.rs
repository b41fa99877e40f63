//! Port interfaces for the tour engine
//!
//! Ports define the contract between the engine and host-provided
//! implementations. This follows Hexagonal Architecture principles, keeping
//! the state machine independent of browsers, storage backends and timers.
//!
//! ## Port Placement Guidelines
//!
//! A port belongs here when it is implemented by the host or the
//! infrastructure layer and consumed by the application layer.

mod clock;
pub mod document;
pub mod kv_store;
pub mod target_watcher;

pub use clock::*;
pub use document::{DocumentPort, ElementHandle, Rect, ScrollBehavior, ScrollOptions, Viewport};
pub use kv_store::{KeyValueStorePort, KvStoreError};
pub use target_watcher::{TargetProbe, TargetWatcherError, TargetWatcherPort};
