//! Step domain module.
//!
//! Step definitions are data only. Anything executable (branching, validation,
//! lifecycle hooks, custom target resolvers) is referenced by rule id and
//! dispatched through [`crate::rules::TourRules`].

pub mod definition;
pub mod registry;

pub use definition::{NextStep, Placement, StepCopy, StepDefinition, StepId, TargetLocator};
pub use registry::StepRegistry;
