//! Navigation domain module.
//!
//! The navigation engine is the tour state machine.

pub mod command;
pub mod engine;

pub use command::{TourCommand, TourCommandSender};
pub use engine::NavigationEngine;
