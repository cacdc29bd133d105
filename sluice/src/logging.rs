//! Process-wide logging setup.
//!
//! Provides structured logging to stderr and, optionally, to a file:
//! - The file (if configured) is cleared on session start
//! - Level comes from `RUST_LOG`, else the configured level, else `info`
//! - `debug` forces the default level to `debug`
//!
//! Library code never calls this; it logs through the injected
//! [`Logger`](crate::log::Logger). Binaries call [`init_logging`] once.

use crate::config::LoggingSettings;
use crate::log::LogLevel;
use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize logging.
///
/// # Errors
///
/// Returns an error if the log file's directory cannot be created or the
/// file cannot be cleared.
pub fn init_logging(settings: &LoggingSettings, debug: bool) -> Result<LoggingGuard, io::Error> {
    let level = effective_level(settings.level, debug);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    let (file_layer, file_guard) = match settings.file.as_deref() {
        Some(path) => {
            let (writer, guard) = open_log_file(path)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Level used when `RUST_LOG` is unset.
fn effective_level(configured: LogLevel, debug: bool) -> LogLevel {
    if debug {
        configured.min(LogLevel::Debug)
    } else {
        configured
    }
}

/// Clears `path` and returns a non-blocking writer appending to it.
fn open_log_file(
    path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), io::Error> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log file path has no file name: {}", path.display()),
        )
    })?;

    fs::create_dir_all(dir)?;
    fs::write(path, "")?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
