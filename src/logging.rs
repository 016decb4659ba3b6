//! Logging setup for the `rhos-bootstrap` binary.
//!
//! Console output goes to stdout. Unless disabled, the same events are
//! appended to a daily log file through a non-blocking writer. For the
//! default `/var/log/rhos-bootstrap.log` that is
//! `/var/log/rhos-bootstrap.<date>.log`, and the last [`MAX_LOG_FILES`]
//! days are kept. The level is `info`, or `debug` when requested;
//! `RUST_LOG` takes precedence over both.

use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILE: &str = "/var/log/rhos-bootstrap.log";
pub const MAX_LOG_FILES: usize = 7;

/// Keeps the file writer alive. Dropping it flushes pending lines.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

fn file_appender(log_file: &Path) -> io::Result<RollingFileAppender> {
    let dir = log_file.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = dir.unwrap_or_else(|| Path::new("."));
    let stem = log_file.file_stem().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a file path", log_file.display()),
        )
    })?;

    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(stem.to_string_lossy().into_owned());
    if let Some(ext) = log_file.extension() {
        builder = builder.filename_suffix(ext.to_string_lossy().into_owned());
    }
    builder.build(dir).map_err(io::Error::other)
}

/// Install the global subscriber.
///
/// Fails without installing anything when the log file cannot be opened, so
/// the caller may retry with `log_file = None`.
pub fn init_logging(debug: bool, log_file: Option<&Path>) -> io::Result<LoggingGuard> {
    let (file_layer, file_guard) = match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_target(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
