//! File logging. Stdout and stderr belong to the terminal UI, so all
//! tracing output goes to `{cache_dir}/promptline/promptline.log`.
//!
//! Logging is optional: when the directory is unusable the client starts
//! anyway, after a single warning on stderr.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "promptline.log";

pub fn log_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir().ok_or_else(|| anyhow!("Could not determine cache directory"))?;
    Ok(cache_dir.join("promptline"))
}

/// Install the global subscriber writing under the default log directory.
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(verbose: bool) -> Option<WorkerGuard> {
    match log_dir() {
        Ok(dir) => init_at(&dir, verbose),
        Err(e) => {
            eprintln!("promptline: file logging disabled: {:#}", e);
            None
        }
    }
}

/// Like [`init`], writing under `dir`. Returns `None` without touching the
/// global subscriber if the log file cannot be opened.
pub fn init_at(dir: &Path, verbose: bool) -> Option<WorkerGuard> {
    let (writer, guard) = match file_writer(dir) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("promptline: file logging disabled: {:#}", e);
            return None;
        }
    };

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("promptline={}", default_level)));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        eprintln!("promptline: failed to initialize logging: {}", e);
        return None;
    }

    Some(guard)
}

fn file_writer(dir: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)
        .map_err(|e| anyhow!("cannot create log directory {}: {}", dir.display(), e))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(dir)?;

    Ok(tracing_appender::non_blocking(appender))
}
