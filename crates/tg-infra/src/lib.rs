//! # tg-infra
//!
//! Adapters for the ports declared in `tg-core`: key-value storage, the
//! system clock, a headless document model, the interval target watcher, and
//! the TOML loaders for engine configuration and step catalogues.

pub mod catalog;
pub mod config;
pub mod document;
pub mod storage;
pub mod time;
pub mod watcher;

pub use catalog::{load_step_catalog, StepCatalog};
pub use config::load_config;
pub use document::HeadlessDocument;
pub use storage::{FileKeyValueStore, InMemoryKeyValueStore};
pub use time::SystemClock;
pub use watcher::IntervalTargetWatcher;
