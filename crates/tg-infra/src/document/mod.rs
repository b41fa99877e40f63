mod headless;

pub use headless::{DocumentLayout, ElementSpec, HeadlessDocument};
