//! Wiring of a [`NavigationEngine`] from a step catalogue and host ports.

use std::sync::Arc;

use tracing::warn;

use tg_core::ports::{ClockPort, DocumentPort, KeyValueStorePort, TargetWatcherPort};
use tg_core::{ConfigurationError, StepDefinition, StepRegistry, TourConfig, TourRules};

use crate::navigation::NavigationEngine;
use crate::session_store::SessionStore;
use crate::target::TargetResolver;
use crate::watcher_binding::WatcherBinding;

/// Builder for [`NavigationEngine`].
///
/// `build()` rejects duplicate step ids and rule references missing from the
/// rule table, then restores any persisted session.
pub struct TourEngineBuilder {
    steps: Vec<StepDefinition>,
    rules: TourRules,
    config: TourConfig,
    storage: Arc<dyn KeyValueStorePort>,
    clock: Arc<dyn ClockPort>,
    document: Option<Arc<dyn DocumentPort>>,
    watcher: Option<Arc<dyn TargetWatcherPort>>,
}

impl TourEngineBuilder {
    pub fn new(
        steps: Vec<StepDefinition>,
        storage: Arc<dyn KeyValueStorePort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            steps,
            rules: TourRules::new(),
            config: TourConfig::default(),
            storage,
            clock,
            document: None,
            watcher: None,
        }
    }

    pub fn rules(mut self, rules: TourRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(mut self, config: TourConfig) -> Self {
        self.config = config;
        self
    }

    pub fn document(mut self, document: Arc<dyn DocumentPort>) -> Self {
        self.document = Some(document);
        self
    }

    pub fn watcher(mut self, watcher: Arc<dyn TargetWatcherPort>) -> Self {
        self.watcher = Some(watcher);
        self
    }

    pub fn build(self) -> Result<NavigationEngine, ConfigurationError> {
        let registry = StepRegistry::new(self.steps)?;
        self.rules.verify(&registry)?;

        let rules = Arc::new(self.rules);
        let store = SessionStore::from_config(self.storage, self.clock, &self.config);
        let targets = self
            .document
            .map(|document| TargetResolver::new(document, rules.clone()));

        let watcher = match (self.watcher, targets.is_some()) {
            (Some(port), true) => Some(WatcherBinding::new(port)),
            (Some(_), false) => {
                warn!("target watcher supplied without a document, ignoring it");
                None
            }
            (None, _) => None,
        };

        Ok(NavigationEngine::from_parts(
            Arc::new(registry),
            rules,
            store,
            targets,
            watcher,
            self.config.gating_mode,
        ))
    }
}
