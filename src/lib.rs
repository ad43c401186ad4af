pub mod commands;
pub mod config;
pub mod db;
pub mod errors;
pub mod folders;
pub mod models;
pub mod service;
pub mod suggest;

use crate::service::FolderService;
use anyhow::Context;
use std::path::Path;
use tokio::io::BufReader;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub fn run() -> anyhow::Result<()> {
    let data_dir = config::resolve_data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    let settings = config::load_settings(&data_dir)?;
    init_tracing(&data_dir, &settings.log_level).map_err(anyhow::Error::msg)?;

    let service = FolderService::open(&data_dir, &settings)?;
    tracing::info!(
        data_dir = %data_dir.display(),
        database = %service.database_path().display(),
        suggestion_command = settings.suggestion.command.as_deref().unwrap_or("none"),
        "para browser started"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(async {
        commands::serve(&service, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
    })?;

    tracing::info!("stdin closed; shutting down");
    Ok(())
}

fn init_tracing(data_dir: &Path, default_level: &str) -> Result<(), String> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "para-browser.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}
