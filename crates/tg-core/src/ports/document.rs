//! Host document access.
//!
//! The engine never renders. It only needs to find an anchor element, read
//! its on-screen rectangle and ask the host to scroll it into view.

use serde::{Deserialize, Serialize};

/// Opaque reference to a host element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bounding rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// True when `rect` lies inside the viewport on all four edges.
    pub fn contains(&self, rect: &Rect) -> bool {
        rect.top >= 0.0
            && rect.left >= 0.0
            && rect.bottom() <= self.height
            && rect.right() <= self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    #[default]
    Smooth,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOptions {
    pub behavior: ScrollBehavior,
    /// Center the element instead of aligning it to the nearest edge.
    pub centered: bool,
}

impl ScrollOptions {
    pub fn smooth_center() -> Self {
        Self {
            behavior: ScrollBehavior::Smooth,
            centered: true,
        }
    }
}

/// Element lookup and scroll primitives provided by the host.
///
/// 宿主提供的元素查找与滚动能力。
///
/// # Behavior / 行为
/// - Lookups return `None` when nothing matches; they never fail.
/// - `scroll_into_view` is a request; hosts may animate it.
pub trait DocumentPort: Send + Sync {
    fn query_selector(&self, selector: &str) -> Option<ElementHandle>;

    /// Current bounding rectangle, `None` if the element is gone.
    fn bounding_rect(&self, element: &ElementHandle) -> Option<Rect>;

    fn viewport(&self) -> Viewport;

    fn scroll_into_view(&self, element: &ElementHandle, options: ScrollOptions);
}
