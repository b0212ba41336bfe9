//! Logging system initialization
//!
//! Sets up the global tracing subscriber from the `[logging]` section.

use std::io::Write;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use crate::config::{LoggingConfig, StaticConfig};

const DEFAULT_LOG_FILE_NAME: &str = "guardlink.log";

type BoxedWriter = Box<dyn Write + Send + Sync>;

/// Initialize logging system based on configuration
///
/// The returned `WorkerGuard` must be kept alive for the duration of the
/// program so buffered log lines get flushed.
///
/// Should be called once, after the configuration has been loaded. A log
/// file that cannot be opened falls back to stdout with a warning on stderr.
pub fn init_logging(config: &StaticConfig) -> WorkerGuard {
    let logging = &config.logging;
    let (writer, to_console) = match build_writer(logging) {
        Ok(Some(writer)) => (writer, false),
        Ok(None) => (Box::new(std::io::stdout()) as BoxedWriter, true),
        Err(e) => {
            eprintln!("[WARN] Failed to open log file, logging to stdout: {}", e);
            (Box::new(std::io::stdout()) as BoxedWriter, true)
        }
    };

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = tracing_subscriber::EnvFilter::try_new(&logging.level).unwrap_or_else(|e| {
        eprintln!(
            "[WARN] Invalid log level '{}': {}, using 'info'",
            logging.level, e
        );
        tracing_subscriber::EnvFilter::new("info")
    });

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(to_console);

    // try_init: tests and embedders may already have a subscriber installed
    let result = if logging.format == "json" {
        subscriber_builder.json().try_init()
    } else {
        subscriber_builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("[WARN] Logging already initialized: {}", e);
    }

    guard
}

/// `Ok(None)` means log to stdout
fn build_writer(logging: &LoggingConfig) -> std::io::Result<Option<BoxedWriter>> {
    let Some(log_file) = logging.file.as_deref().filter(|f| !f.is_empty()) else {
        return Ok(None);
    };

    if !logging.enable_rotation {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        return Ok(Some(Box::new(file)));
    }

    let path = Path::new(log_file);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(DEFAULT_LOG_FILE_NAME);

    let appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix(filename.trim_end_matches(".log"))
        .filename_suffix("log")
        .max_log_files(logging.max_backups.max(1) as usize)
        .build(dir.unwrap_or(Path::new(".")))
        .map_err(std::io::Error::other)?;

    Ok(Some(Box::new(appender)))
}
