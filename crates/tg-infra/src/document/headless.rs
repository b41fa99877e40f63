//! In-process document model for terminal hosts and tests.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use tg_core::ports::{DocumentPort, ElementHandle, Rect, ScrollOptions, Viewport};

/// One element, positioned in page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub id: String,
    pub selector: String,
    pub rect: Rect,
}

/// Serializable page layout, usually the `[document]` table of a catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

impl Default for DocumentLayout {
    fn default() -> Self {
        Self {
            viewport: default_viewport(),
            elements: Vec::new(),
        }
    }
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1280.0,
        height: 800.0,
    }
}

struct PageState {
    viewport: Viewport,
    elements: Vec<ElementSpec>,
    scroll_y: f64,
    scroll_requests: usize,
}

/// A vertically scrolling page with no renderer behind it.
pub struct HeadlessDocument {
    page: Mutex<PageState>,
}

impl HeadlessDocument {
    pub fn new(layout: DocumentLayout) -> Self {
        Self {
            page: Mutex::new(PageState {
                viewport: layout.viewport,
                elements: layout.elements,
                scroll_y: 0.0,
                scroll_requests: 0,
            }),
        }
    }

    fn page(&self) -> MutexGuard<'_, PageState> {
        match self.page.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Add or replace an element.
    pub fn insert(&self, element: ElementSpec) {
        let mut page = self.page();
        page.elements.retain(|existing| existing.id != element.id);
        page.elements.push(element);
    }

    /// Remove an element. Returns false if it was not present.
    pub fn remove(&self, id: &str) -> bool {
        let mut page = self.page();
        let before = page.elements.len();
        page.elements.retain(|existing| existing.id != id);
        page.elements.len() != before
    }

    pub fn scroll_y(&self) -> f64 {
        self.page().scroll_y
    }

    pub fn scroll_requests(&self) -> usize {
        self.page().scroll_requests
    }
}

impl DocumentPort for HeadlessDocument {
    fn query_selector(&self, selector: &str) -> Option<ElementHandle> {
        self.page()
            .elements
            .iter()
            .find(|element| element.selector == selector)
            .map(|element| ElementHandle::new(element.id.clone()))
    }

    fn bounding_rect(&self, element: &ElementHandle) -> Option<Rect> {
        let page = self.page();
        page.elements
            .iter()
            .find(|entry| entry.id == element.as_str())
            .map(|entry| Rect {
                top: entry.rect.top - page.scroll_y,
                ..entry.rect
            })
    }

    fn viewport(&self) -> Viewport {
        self.page().viewport
    }

    fn scroll_into_view(&self, element: &ElementHandle, options: ScrollOptions) {
        let mut page = self.page();
        let Some(rect) = page
            .elements
            .iter()
            .find(|entry| entry.id == element.as_str())
            .map(|entry| entry.rect)
        else {
            return;
        };

        let target = if options.centered {
            rect.top + rect.height / 2.0 - page.viewport.height / 2.0
        } else {
            rect.top
        };
        page.scroll_y = target.max(0.0);
        page.scroll_requests += 1;
        debug!(element = element.as_str(), scroll_y = page.scroll_y, "headless scroll");
    }
}
