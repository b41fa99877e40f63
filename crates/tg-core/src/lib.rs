//! # tg-core
//!
//! Core domain models and business logic for the guided tour engine.
//!
//! This crate contains pure business logic without any infrastructure dependencies.

// Public module exports
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod gating;
pub mod ports;
pub mod rules;
pub mod session;
pub mod step;

// Re-export commonly used types at the crate root
pub use config::TourConfig;
pub use context::{HostFacts, TourContext};
pub use error::ConfigurationError;
pub use event::TourEvent;
pub use gating::{GateDecision, GatingMode};
pub use rules::{RuleKind, TourRules};
pub use session::{TourState, UserLevel};
pub use step::{NextStep, StepCopy, StepDefinition, StepId, StepRegistry, TargetLocator};
