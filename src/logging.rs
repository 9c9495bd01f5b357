use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use replybot_core::CoreError;
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_NAME: &str = "replybot.log";
const MAX_LOG_BYTES: usize = 100_000;
const RETAINED_LOGS: usize = 5;
const TIMESTAMP_FORMAT: &str = "%d-%m-%Y|%H:%M:%S";
const DEFAULT_FILTER: &str = "info";

/// Keeps the background log writer alive. Dropping it flushes pending lines.
pub struct LogGuard {
    _worker: WorkerGuard,
}

/// Installs the global subscriber: stdout plus a size-rotated file in `logs_dir`.
pub fn init(logs_dir: &Path) -> Result<LogGuard, CoreError> {
    let (file_writer, worker) = tracing_appender::non_blocking(rotating_writer(logs_dir)?);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_timer(timer()).with_target(false))
        .with(
            fmt::layer()
                .with_timer(timer())
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|e| CoreError::Internal {
            message: format!("Failed to install log subscriber: {}", e),
        })?;

    Ok(LogGuard { _worker: worker })
}

fn timer() -> ChronoLocal {
    ChronoLocal::new(TIMESTAMP_FORMAT.to_string())
}

fn rotating_writer(logs_dir: &Path) -> Result<FileRotate<AppendCount>, CoreError> {
    fs::create_dir_all(logs_dir)?;
    Ok(FileRotate::new(
        logs_dir.join(LOG_FILE_NAME),
        AppendCount::new(RETAINED_LOGS),
        ContentLimit::Bytes(MAX_LOG_BYTES),
        Compression::None,
        #[cfg(unix)]
        None,
    ))
}
