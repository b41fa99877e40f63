//! # tg-app
//!
//! Application layer of the guided tour engine: the navigation state machine,
//! session persistence, event distribution and target resolution, wired
//! against the ports declared in `tg-core`.

pub mod builder;
pub mod navigation;
pub mod notification;
pub mod session_store;
pub mod target;
pub mod watcher_binding;

pub use builder::TourEngineBuilder;
pub use navigation::{NavigationEngine, TourCommand, TourCommandSender};
pub use notification::{NotificationBus, Subscription, TourListener};
pub use session_store::SessionStore;
pub use target::TargetResolver;
pub use watcher_binding::WatcherBinding;
