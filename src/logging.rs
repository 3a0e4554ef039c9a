//! Logging infrastructure for dupescan.
//!
//! This module provides structured logging using the `log` facade and the
//! `env_logger` backend, writing to a log file opened in append mode. The
//! duplicate report itself is a stream of `info` records in that file.
//!
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flag: `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! `--quiet` only silences the terminal; the file keeps at least info so
//! the report is always written.
//!
//! Every line has the form
//! `<timestamp> <LEVEL> <module> - <file>:<line>: <message>`.
//! `log` records carry no function name, so the module path together with
//! the source location identifies the function that emitted the line.
//!
//! # Example
//!
//! ```rust,no_run
//! use dupescan::logging::init_logging;
//! use std::path::Path;
//!
//! init_logging(0, Path::new("dupescan.log")).unwrap();
//! log::info!("Application started");
//! ```

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Errors raised while setting up logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The log file could not be opened for appending.
    #[error("Cannot open log file {path}: {source}")]
    Open {
        /// Log file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A global logger was already installed.
    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(#[from] log::SetLoggerError),
}

/// Initialize the logging subsystem, appending to `log_file`.
///
/// This function should be called once at the start of the application,
/// before any logging calls are made.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=normal, 1=debug, 2+=trace)
/// * `log_file` - File to append to; created if missing
///
/// # Errors
///
/// Returns [`LoggingError::Open`] if the file cannot be opened and
/// [`LoggingError::AlreadyInitialized`] on a second call.
pub fn init_logging(verbose: u8, log_file: &Path) -> Result<(), LoggingError> {
    let file = open_log_file(log_file)?;
    let use_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();

    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose));
    }

    builder.target(Target::Pipe(Box::new(file)));
    builder.write_style(env_logger::WriteStyle::Never);
    builder.format(|buf, record| {
        let timestamp = buf.timestamp_millis();
        writeln!(
            buf,
            "{}",
            format_line(
                &timestamp.to_string(),
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args(),
            )
        )
    });

    builder.try_init()?;

    if use_env {
        log::debug!(
            "Logging initialized from RUST_LOG environment variable: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log::debug!("Logging initialized at level: {:?}", determine_level(verbose));
    }

    Ok(())
}

/// Open `path` for appending, creating it if needed.
///
/// # Errors
///
/// Returns [`LoggingError::Open`] if the file cannot be opened.
pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Render one log line (without the trailing newline).
#[must_use]
pub fn format_line(
    timestamp: &str,
    level: log::Level,
    module: &str,
    file: &str,
    line: u32,
    message: &std::fmt::Arguments<'_>,
) -> String {
    format!("{timestamp} {level:<5} {module} - {file}:{line}: {message}")
}

/// Determine the log level from the verbosity count. Never below info.
fn determine_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
