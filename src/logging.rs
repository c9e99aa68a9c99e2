use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt;

pub const LOG_FILE_PREFIX: &str = "app.log";

/// Steps shown when the log directory cannot be used.
pub const REMEDIATION: &[&str] = &[
    "Check that DHT11_LOG_DIR points at a directory you can create and write to",
    "Unset DHT11_LOG_DIR to log into ./logs",
];

/// Daily rotating appender in `log_dir`, failing instead of panicking when the
/// directory cannot be created.
pub fn file_appender(log_dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir)
}

/// Install the global subscriber. The guard must live until the end of main.
pub fn setup_logging(log_dir: &Path) -> Result<WorkerGuard, InitError> {
    // File-only so log lines do not interleave with the rendered screen
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(log_dir)?);

    fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_level(true)
        .init();

    Ok(guard)
}
