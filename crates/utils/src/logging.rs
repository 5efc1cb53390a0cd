//! provides logging helpers

use std::env;
use std::path::Path;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// Env var naming a log file; when set, logs are also written to a daily rotated file.
pub const LOG_PATH_ENV_VAR: &str = "CLUSTER_WATCHER_LOG_PATH";

const MAX_LOG_FILES: usize = 7;

/// initiate the global tracing subscriber
///
/// The returned guard flushes the file writer on drop and must be held by `main`.
pub fn init() -> Option<WorkerGuard> {
    let log_path = env::var(LOG_PATH_ENV_VAR)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();

    let stderr_layer = layer().with_writer(std::io::stderr).with_target(true);

    let (file_layer, guard) = match log_path.as_deref().and_then(rolling_writer) {
        Some((writer, guard)) => (
            Some(layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        ),
        None => (None, None),
    };

    registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    guard
}

fn rolling_writer(
    log_path: &Path,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let (dir, prefix) = split_log_path(log_path)?;
    match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
    {
        Ok(appender) => Some(tracing_appender::non_blocking(appender)),
        Err(e) => {
            // the subscriber is not installed yet
            eprintln!("failed to create log file appender in {}: {e}", dir.display());
            None
        }
    }
}

/// Splits `/var/log/watcher.log` into the directory and the rotation file prefix.
fn split_log_path(log_path: &Path) -> Option<(&Path, &str)> {
    let prefix = log_path.file_name()?.to_str()?;
    let dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Some((dir, prefix))
}
