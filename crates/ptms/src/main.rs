//! # ptms
//!
//! Project-TMS binary: runs the JSON file server or works on a task board
//! through whichever storage backend the settings select.

#![deny(unsafe_code)]

mod cli;
mod commands;
mod render;
mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ptms_core::SystemClock;
use ptms_events::EventBus;
use ptms_server::ServerConfig;
use ptms_settings::{PtmsSettings, StorageMode};
use ptms_storage::{FallbackStore, FileStore, LocalStore, PersistenceGateway, RemoteStore};
use ptms_tasks::Workspace;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cli::{Cli, Command};

fn load_settings(path: Option<&Path>) -> Result<PtmsSettings> {
    let settings = match path {
        Some(path) => ptms_settings::load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => ptms_settings::load_settings().context("Failed to load settings")?,
    };
    Ok(settings)
}

/// Build the persistence gateway the settings ask for.
///
/// Remote mode reads and writes through the file server and falls back to a
/// local cache file while it is unreachable.
async fn open_gateway(settings: &PtmsSettings, home: &Path) -> Result<Arc<dyn PersistenceGateway>> {
    let gateway: Arc<dyn PersistenceGateway> = match settings.storage.mode {
        StorageMode::File => Arc::new(FileStore::new(settings.storage_dir(home))),
        StorageMode::Remote => {
            let cache_path = settings.cache_dir(home).join("cache.json");
            let cache = LocalStore::open(&cache_path)
                .await
                .with_context(|| format!("Failed to open cache {}", cache_path.display()))?;
            let remote = RemoteStore::new(
                settings.storage.api_url.clone(),
                Duration::from_millis(settings.storage.timeout_ms),
            );
            Arc::new(FallbackStore::new(Arc::new(remote), Arc::new(cache)))
        }
        StorageMode::Local => {
            let path = home.join("local.json");
            Arc::new(
                LocalStore::open(&path)
                    .await
                    .with_context(|| format!("Failed to open {}", path.display()))?,
            )
        }
    };
    info!(backend = gateway.backend(), "storage selected");
    Ok(gateway)
}

fn server_config(
    settings: &PtmsSettings,
    home: &Path,
    host: Option<String>,
    port: Option<u16>,
    storage_dir: Option<PathBuf>,
) -> ServerConfig {
    let mut config = ServerConfig::from_settings(settings, home);
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(dir) = storage_dir {
        config.storage_dir = dir;
    }
    config
}

async fn run(cli: Cli, settings: PtmsSettings, home: &Path) -> Result<()> {
    if let Command::Serve {
        host,
        port,
        storage_dir,
    } = cli.command
    {
        return session::serve(server_config(&settings, home, host, port, storage_dir)).await;
    }

    let gateway = open_gateway(&settings, home).await?;
    let ws = Workspace::open(gateway, Arc::new(EventBus::new()), Arc::new(SystemClock))
        .await
        .context("Failed to open workspace")?;
    let mut out = std::io::stdout();

    match cli.command {
        // handled before the workspace is opened
        Command::Serve { .. } => Ok(()),
        Command::Project(command) => commands::project(&ws, command, &mut out).await,
        Command::Task(command) => commands::task(&ws, command, &mut out).await,
        Command::Timer(command) => commands::timer(&ws, command, &mut out).await,
        Command::Board { project_id } => commands::board(&ws, project_id, &mut out).await,
        Command::Metrics { project_id, period } => {
            commands::metrics(&ws, project_id, period, &mut out).await
        }
        Command::Export { file } => commands::export(&ws, file.as_deref(), &mut out).await,
        Command::Import { file } => commands::import(&ws, &file, &mut out).await,
        Command::Watch { project_id } => {
            let tick = Duration::from_millis(settings.timer.tick_interval_ms);
            session::watch(
                &ws,
                project_id.into(),
                tick,
                CancellationToken::new(),
                &mut out,
            )
            .await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.settings.as_deref())?;

    if settings.logging.json {
        ptms_core::logging::init_json_subscriber(&settings.logging.level);
    } else {
        ptms_core::logging::init_subscriber(&settings.logging.level);
    }

    let home = ptms_settings::ptms_home();
    let result = run(cli, settings, &home).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "command failed");
    }
    result
}
