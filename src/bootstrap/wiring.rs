//! Assembles a tour engine for the dashboard host.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::runtime::Handle;
use tracing::info;

use tg_app::{NavigationEngine, TourEngineBuilder};
use tg_core::ports::{DocumentPort, KeyValueStorePort};
use tg_core::rules::HookPhase;
use tg_core::{TourConfig, TourRules};
use tg_infra::{HeadlessDocument, IntervalTargetWatcher, StepCatalog, SystemClock};

pub const WALLET_ROUTE: &str = "wallet-route";
pub const WALLET_CONNECTED: &str = "wallet-connected";
pub const HAS_ASSET_NAME: &str = "has-asset-name";
pub const LOG_STEP: &str = "log-step";
pub const FIRST_ASSET_ROW: &str = "first-asset-row";

/// Rule table backing the dashboard catalogue.
pub fn dashboard_rules() -> TourRules {
    TourRules::new()
        .branch(WALLET_ROUTE, |ctx| {
            let next = if ctx.is_wallet_connected {
                "assets"
            } else {
                "connect-wallet"
            };
            Some(next.to_string())
        })
        .validator(WALLET_CONNECTED, |ctx| ctx.is_wallet_connected)
        .completion_check(HAS_ASSET_NAME, |ctx| ctx.has_form_value("asset_name"))
        .hook(LOG_STEP, |event| {
            let phase = match event.phase {
                HookPhase::Enter => "enter",
                HookPhase::Exit => "exit",
                HookPhase::Complete => "complete",
            };
            info!(step_id = %event.step.id, phase, level = %event.context.user_level, "tour step hook");
            Ok(())
        })
        .resolver(FIRST_ASSET_ROW, |document| {
            document
                .query_selector("[data-tour=asset-row]")
                .or_else(|| document.query_selector("[data-tour=assets]"))
        })
}

/// Where the session file lives when `--state-file` is not given.
pub fn default_state_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("tourguide")
        .join("session.json")
}

pub struct TourHost {
    pub engine: NavigationEngine,
    pub document: Option<Arc<HeadlessDocument>>,
}

/// Build the engine from a loaded catalogue.
///
/// The target watcher is attached only when the catalogue carries a
/// `[document]` layout and a runtime is available to drive it.
pub fn build_host(
    config: TourConfig,
    catalog: StepCatalog,
    storage: Arc<dyn KeyValueStorePort>,
    runtime: Option<Handle>,
) -> anyhow::Result<TourHost> {
    let document = catalog.document.map(|layout| Arc::new(HeadlessDocument::new(layout)));

    let mut builder = TourEngineBuilder::new(catalog.steps, storage, Arc::new(SystemClock))
        .rules(dashboard_rules())
        .config(config.clone());

    if let Some(document) = &document {
        builder = builder.document(document.clone() as Arc<dyn DocumentPort>);
        if let Some(runtime) = runtime {
            builder = builder.watcher(Arc::new(IntervalTargetWatcher::with_runtime(
                config.watch_interval(),
                runtime,
            )));
        }
    }

    let engine = builder.build().context("invalid step catalog")?;
    Ok(TourHost { engine, document })
}
