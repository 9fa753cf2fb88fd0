//! JSON-lines logging to a file. The terminal belongs to the form.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::prelude::*;

pub const FILTER_ENV: &str = "FORMSTEP_LOG";
pub const DEFAULT_FILTER: &str = "formstep=info";

/// Install the global subscriber writing to a new file in `log_dir`.
///
/// Returns the path of the log file.
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let log_file = log_file_path(log_dir, chrono::Local::now());
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_env(FILTER_ENV)
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(log_file)
}

fn log_file_path(log_dir: &Path, now: chrono::DateTime<chrono::Local>) -> PathBuf {
    log_dir.join(format!("formstep-{}.jsonl", now.format("%Y%m%d-%H%M%S")))
}
