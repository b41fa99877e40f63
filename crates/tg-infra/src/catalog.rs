//! Step catalogue files.
//!
//! ```toml
//! [[steps]]
//! id = "welcome"
//! title = "Welcome"
//! content = "A short tour of the dashboard."
//!
//! [[steps]]
//! id = "assets"
//! title = "Your assets"
//! content = "Every tokenized asset is listed here."
//! target = { selector = "[data-tour=assets]" }
//! next_step = { kind = "computed", rule = "wallet-route" }
//!
//! [document]
//! viewport = { width = 1280.0, height = 800.0 }
//! elements = [{ id = "assets", selector = "[data-tour=assets]", rect = { left = 0.0, top = 900.0, width = 800.0, height = 300.0 } }]
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use tg_core::StepDefinition;

use crate::document::DocumentLayout;

/// Steps in tour order plus an optional page layout for headless hosts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StepCatalog {
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub document: Option<DocumentLayout>,
}

pub fn load_step_catalog(path: &Path) -> anyhow::Result<StepCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read step catalog: {}", path.display()))?;
    let catalog: StepCatalog = toml::from_str(&content)
        .with_context(|| format!("Failed to parse step catalog: {}", path.display()))?;
    debug!(
        path = %path.display(),
        steps = catalog.steps.len(),
        has_document = catalog.document.is_some(),
        "step catalog loaded"
    );
    Ok(catalog)
}
