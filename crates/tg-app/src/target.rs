//! Anchor element resolution.

use std::sync::Arc;

use tracing::{debug, warn};

use tg_core::ports::{DocumentPort, ElementHandle, ScrollOptions, TargetProbe};
use tg_core::{StepDefinition, TargetLocator, TourRules};

/// Resolves a step's target and keeps it on screen.
///
/// 解析步骤的目标元素并确保其可见。
#[derive(Clone)]
pub struct TargetResolver {
    document: Arc<dyn DocumentPort>,
    rules: Arc<TourRules>,
}

impl TargetResolver {
    pub fn new(document: Arc<dyn DocumentPort>, rules: Arc<TourRules>) -> Self {
        Self { document, rules }
    }

    /// Find the element `step` anchors to. `None` when the step has no target
    /// or nothing matches.
    pub fn resolve(&self, step: &StepDefinition) -> Option<ElementHandle> {
        let locator = step.target.as_ref()?;
        locate(self.document.as_ref(), &self.rules, locator)
    }

    pub fn is_visible(&self, element: &ElementHandle) -> bool {
        match self.document.bounding_rect(element) {
            Some(rect) => self.document.viewport().contains(&rect),
            None => false,
        }
    }

    /// Request a smooth, centered scroll when `element` is not fully visible.
    ///
    /// Returns true when a scroll was requested.
    pub fn ensure_visible(&self, element: &ElementHandle) -> bool {
        if self.is_visible(element) {
            return false;
        }
        debug!(element = element.as_str(), "scrolling tour target into view");
        self.document
            .scroll_into_view(element, ScrollOptions::smooth_center());
        true
    }

    /// Existence check for `step` that can be polled off the engine.
    pub fn probe(&self, step: &StepDefinition) -> Option<TargetProbe> {
        let locator = step.target.clone()?;
        let document = self.document.clone();
        let rules = self.rules.clone();
        Some(Arc::new(move || {
            locate(document.as_ref(), &rules, &locator).is_some()
        }))
    }
}

fn locate(
    document: &dyn DocumentPort,
    rules: &TourRules,
    locator: &TargetLocator,
) -> Option<ElementHandle> {
    match locator {
        TargetLocator::Selector(selector) => document.query_selector(selector),
        TargetLocator::Resolver(rule) => match rules.get_resolver(rule) {
            Some(resolver) => resolver(document),
            None => {
                warn!(rule = %rule, "target resolver not registered");
                None
            }
        },
    }
}
