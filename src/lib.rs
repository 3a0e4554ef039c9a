//! dupescan - duplicate file scanner
//!
//! Walks a directory tree, compares files pairwise by BLAKE3 fingerprint and
//! logs every pair of files with identical content.
//!
//! The pipeline is two phases:
//!
//! 1. [`scanner::Walker`] collects the [`scanner::CandidateSet`]
//! 2. [`duplicates::DuplicateFinder`] compares candidate pairs and reports
//!    [`duplicates::DuplicatePair`]s
//!
//! [`run_app`] wires both to the CLI, configuration, logging, progress
//! display and Ctrl+C handling.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::sync::Arc;

use anyhow::{Context, Result};

use cli::Cli;
use config::Config;
use duplicates::DuplicateFinder;
use error::ExitCode;
use logging::LoggingError;
use progress::{format_summary, Progress};

/// Run a scan for the parsed command line.
///
/// Fatal errors (bad configuration, unusable root, unopenable log file)
/// are returned as `Err`. An interrupted detection returns
/// [`ExitCode::Interrupted`]; an interrupted collection returns
/// [`duplicates::FinderError::Interrupted`].
///
/// # Errors
///
/// See above.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?.apply_cli(&cli);

    match logging::init_logging(cli.verbose, &config.log_file) {
        Ok(()) => {}
        Err(LoggingError::AlreadyInitialized(_)) => {
            log::debug!("Logger already installed, keeping it");
        }
        Err(e) => return Err(e.into()),
    }

    log::debug!("Configuration: {:?}", config);

    let handler = signal::install_handler().context("Cannot handle Ctrl+C")?;
    let progress = Arc::new(Progress::new(cli.quiet));

    let finder_config = config
        .finder_config()
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);
    let finder = DuplicateFinder::new(finder_config);

    let (pairs, summary) = finder.find_duplicates_in(&cli.path)?;

    if !cli.quiet {
        println!(
            "{}",
            format_summary(summary.files_checked, summary.estimated_remaining())
        );

        let wasted: u64 = summary.groups.iter().map(|g| g.wasted_space()).sum();
        println!(
            "{} duplicate pair(s) in {} group(s), {} reclaimable. Report: {}",
            pairs.len(),
            summary.groups.len(),
            bytesize::ByteSize(wasted),
            config.log_file.display()
        );
        if summary.failed_files > 0 {
            println!("{} file(s) could not be read.", summary.failed_files);
        }
    }

    if summary.interrupted {
        log::info!(
            "Scan interrupted with {} comparison(s) remaining",
            summary.remaining_comparisons()
        );
        return Ok(ExitCode::Interrupted);
    }

    log::info!(
        "Scan finished in {:.2}s: {} duplicate pair(s)",
        summary.elapsed.as_secs_f64(),
        summary.duplicate_pairs
    );

    Ok(ExitCode::Success)
}
