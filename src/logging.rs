//! Log setup.
//!
//! The TUI owns stdout/stderr, so logs always go to a file. `RUST_LOG`
//! overrides the default filter.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "progress-demo.log";
const DEFAULT_FILTER: &str = "progress_demo=info";

/// Default log location: the platform state dir, falling back to the temp dir.
pub fn default_log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("progress-demo")
        .join(LOG_FILE_NAME)
}

/// Install the global subscriber. Keep the guard alive until exit so buffered lines flush.
pub fn init(log_file: Option<&Path>) -> Result<WorkerGuard> {
    let path = log_file
        .map(Path::to_path_buf)
        .unwrap_or_else(default_log_path);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .context("log path has no file name")?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .context("install tracing subscriber")?;

    tracing::info!(path = %path.display(), "logging initialised");
    Ok(guard)
}
