//! Subscriber setup. Commands log to stderr; the interactive browser owns the
//! terminal, so it logs to a file under the cache directory instead.

use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::consts::{CONFIG_DIR_NAME, LOG_FILE_NAME, PASSVIEW_LOG};

fn filter() -> EnvFilter {
    EnvFilter::try_new(PASSVIEW_LOG.as_str()).unwrap_or_else(|_| EnvFilter::new("warn"))
}

pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Logs to `<cache dir>/passview/passview.log`. Keep the guard alive for as
/// long as logging should be flushed.
pub fn init_file() -> Option<WorkerGuard> {
    let dir = log_dir()?;
    if fs::create_dir_all(&dir).is_err() {
        return None;
    }

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}

fn log_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.cache_dir().join(CONFIG_DIR_NAME))
}
