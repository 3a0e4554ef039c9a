//! Command-line interface definitions for dupescan.
//!
//! This module defines the CLI arguments using the clap derive API.
//!
//! # Example
//!
//! ```bash
//! # Scan a directory
//! dupescan ~/Downloads
//!
//! # Compare every pair regardless of size, confirming matches byte-for-byte
//! dupescan --no-size-filter --paranoid ~/Downloads
//!
//! # Debug logging to a custom file, hashing on 4 threads
//! dupescan -v --log-file /tmp/scan.log --io-threads 4 ~/Downloads
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Find files with identical content under a directory.
///
/// Every regular file below PATH is collected, candidate pairs are compared
/// by BLAKE3 fingerprint, and each duplicate pair is written to the log
/// file. Progress is shown on stdout.
#[derive(Debug, Parser)]
#[command(name = "dupescan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hide progress and summary output (the log file is still written)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log file for the duplicate report (appended to)
    ///
    /// Defaults to dupescan.log in the working directory.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Follow symbolic links during scan
    ///
    /// By default links are skipped. Cycles are detected and skipped.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Compare every pair of files, not only pairs of equal size
    #[arg(long)]
    pub no_size_filter: bool,

    /// Enable paranoid mode: byte-by-byte verification after hash match
    ///
    /// Slower but guarantees no hash collisions.
    #[arg(long)]
    pub paranoid: bool,

    /// Number of threads used to fingerprint files up front
    ///
    /// 1 (the default) hashes each file on first comparison.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Configuration file (TOML)
    ///
    /// If not specified, config.toml in the platform config directory is
    /// used when present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
