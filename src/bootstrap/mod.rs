//! Host shell: logging, engine wiring and the terminal renderer.

pub mod run;
pub mod tracing;
pub mod wiring;

pub use run::{parse_command, run_repl, ReplCommand};
pub use self::tracing::init_tracing_subscriber;
pub use wiring::{build_host, dashboard_rules, default_state_file, TourHost};
