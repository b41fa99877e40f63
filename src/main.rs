use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use tg_core::ports::KeyValueStorePort;
use tg_core::TourConfig;
use tg_infra::{load_config, load_step_catalog, FileKeyValueStore};
use tourguide_lib::bootstrap::{build_host, default_state_file, init_tracing_subscriber, run_repl};

/// Walk through the dashboard tour in the terminal.
#[derive(Debug, Parser)]
#[command(name = "tourguide", version, about)]
struct Cli {
    /// Engine configuration (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Step catalogue (TOML).
    #[arg(long, default_value = "assets/dashboard_tour.toml")]
    catalog: PathBuf,

    /// Session file. Defaults to the platform's local data directory.
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Forget any persisted session before starting.
    #[arg(long)]
    fresh: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing_subscriber()?;

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TourConfig::default(),
    };
    let catalog = load_step_catalog(&cli.catalog)?;

    let state_file = cli.state_file.clone().unwrap_or_else(default_state_file);
    let storage = Arc::new(FileKeyValueStore::new(&state_file));
    if cli.fresh {
        if let Err(err) = storage.remove(&config.storage_key) {
            warn!(error = %err, "could not clear persisted session");
        }
    }
    info!(
        catalog = %cli.catalog.display(),
        state_file = %state_file.display(),
        gating = ?config.gating_mode,
        "starting tour host"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("tour-watcher")
        .enable_time()
        .build()
        .context("failed to start watcher runtime")?;

    let mut host = build_host(config, catalog, storage, Some(runtime.handle().clone()))?;
    run_repl(&mut host, io::stdin().lock(), io::stdout().lock())
}
