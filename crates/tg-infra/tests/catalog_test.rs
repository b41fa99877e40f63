use std::fs;

use tempfile::TempDir;
use tg_core::ports::DocumentPort;
use tg_core::{GatingMode, NextStep, StepRegistry, TargetLocator};
use tg_infra::{load_step_catalog, HeadlessDocument};

const CATALOG: &str = r##"
[[steps]]
id = "welcome"
title = "Welcome"
content = "A short tour of the dashboard."
skippable = true

[[steps]]
id = "connect-wallet"
title = "Connect your wallet"
content = "Most actions need a connected wallet."
required_action = true
validate = "wallet-connected"
hint = "Use the Connect button in the header."
gating = "strict"
target = { selector = "#connect-wallet" }
next_step = { kind = "computed", rule = "wallet-route" }

[[steps]]
id = "assets"
title = "Your assets"
content = "Every tokenized asset is listed here."
target = { resolver = "first-asset-row" }
placement = "bottom"

[document]
viewport = { width = 1024.0, height = 700.0 }
elements = [
  { id = "connect", selector = "#connect-wallet", rect = { left = 900.0, top = 10.0, width = 100.0, height = 40.0 } },
]
"##;

#[test]
fn catalog_loads_steps_and_layout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tour.toml");
    fs::write(&path, CATALOG).unwrap();

    let catalog = load_step_catalog(&path).unwrap();

    let registry = StepRegistry::new(catalog.steps).unwrap();
    assert_eq!(
        registry.ids().collect::<Vec<_>>(),
        vec!["welcome", "connect-wallet", "assets"]
    );

    let wallet = registry.get("connect-wallet").unwrap();
    assert!(wallet.required_action);
    assert_eq!(wallet.gating, Some(GatingMode::Strict));
    assert_eq!(
        wallet.next_step,
        Some(NextStep::Computed {
            rule: "wallet-route".into()
        })
    );
    assert_eq!(
        registry.get("assets").unwrap().target,
        Some(TargetLocator::Resolver("first-asset-row".into()))
    );

    let document = HeadlessDocument::new(catalog.document.unwrap());
    assert!(document.query_selector("#connect-wallet").is_some());
    assert_eq!(document.viewport().height, 700.0);
}

#[test]
fn catalog_without_document_section() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tour.toml");
    fs::write(
        &path,
        "[[steps]]\nid = \"only\"\ntitle = \"Only\"\ncontent = \"Just one step.\"\n",
    )
    .unwrap();

    let catalog = load_step_catalog(&path).unwrap();

    assert_eq!(catalog.steps.len(), 1);
    assert!(catalog.document.is_none());
}

#[test]
fn malformed_catalog_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[[steps]]\nid = 3\n").unwrap();

    let err = load_step_catalog(&path).unwrap_err();

    assert!(format!("{err:#}").contains("broken.toml"));
}

#[test]
fn misspelled_step_key_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("typo.toml");
    fs::write(
        &path,
        "[[steps]]\nid = \"only\"\ntitle = \"Only\"\ncontent = \"One.\"\nskipable = true\n",
    )
    .unwrap();

    let err = load_step_catalog(&path).unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("typo.toml"));
    assert!(message.contains("skipable"));
}
