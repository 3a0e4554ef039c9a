//! Candidate collection by directory traversal.
//!
//! # Overview
//!
//! [`Walker`] visits every directory reachable from a root and builds the
//! [`CandidateSet`]: every regular file the process can open for reading.
//! Traversal is single-threaded and sorted by file name, so the
//! enumeration order is deterministic for a given tree.
//!
//! Entries that cannot be statted or opened, unreadable subdirectories,
//! special files and (by default) symbolic links are skipped silently, as
//! are the paths listed in [`WalkerConfig::excluded`]. Only a bad root is
//! an error.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let candidates = walker.collect().unwrap();
//! println!("{} files found", candidates.len());
//! ```

use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytesize::ByteSize;
use walkdir::{DirEntry, WalkDir};

use super::{CandidateSet, FileEntry, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Directory walker producing the candidate set.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback, told about each visited directory
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops and returns the
    /// files collected so far.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Make sure the root exists, is a directory and can be listed.
    ///
    /// Returns the canonical absolute root on success.
    fn validate_root(&self) -> Result<PathBuf, ScanError> {
        let metadata = fs::metadata(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        fs::read_dir(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;

        fs::canonicalize(&self.root).map_err(|e| ScanError::from_io(&self.root, e))
    }

    /// Canonical forms of the excluded paths. Paths that do not exist
    /// cannot be collected either and are dropped.
    fn excluded_paths(&self) -> HashSet<PathBuf> {
        self.config
            .excluded
            .iter()
            .filter_map(|path| fs::canonicalize(path).ok())
            .collect()
    }

    /// Walk the tree and collect every regular, readable file.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if the root does not exist, is not a
    /// directory, or cannot be listed. Nothing below the root produces an
    /// error.
    pub fn collect(&self) -> Result<CandidateSet, ScanError> {
        let root = self.validate_root()?;
        let skip_hidden = self.config.skip_hidden;
        let mut candidates = CandidateSet::new();
        let mut directories = 0usize;
        let excluded = self.excluded_paths();

        log::debug!(
            "Walking {} (follow_symlinks={}, skip_hidden={})",
            root.display(),
            self.config.follow_symlinks,
            skip_hidden
        );

        let walk = WalkDir::new(&root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !(skip_hidden && entry.depth() > 0 && is_hidden(entry)));

        for result in walk {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping traversal");
                break;
            }

            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    if e.depth() == 0 {
                        let source = e
                            .into_io_error()
                            .unwrap_or_else(|| std::io::Error::other("walk failed at root"));
                        return Err(ScanError::from_io(&root, source));
                    }
                    log::trace!("Skipping inaccessible entry: {}", e);
                    continue;
                }
            };

            let file_type = entry.file_type();

            if file_type.is_dir() {
                directories += 1;
                if let Some(ref callback) = self.progress_callback {
                    callback.on_directory_visited(directories, candidates.len());
                }
                continue;
            }

            if file_type.is_symlink() {
                log::trace!("Skipping symlink: {}", entry.path().display());
                continue;
            }

            if !file_type.is_file() {
                log::trace!("Skipping special file: {}", entry.path().display());
                continue;
            }

            if excluded.contains(entry.path()) {
                log::debug!("Skipping excluded file: {}", entry.path().display());
                continue;
            }

            if let Some(file) = self.process_file_entry(&entry) {
                candidates.insert(file);
            }
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_directory_visited(directories, candidates.len());
        }

        log::info!(
            "Collected {} candidate file(s) ({}) from {} director(ies) under {}",
            candidates.len(),
            ByteSize(candidates.total_size()),
            directories,
            root.display()
        );

        Ok(candidates)
    }

    /// Stat and open a regular file; `None` if either fails.
    fn process_file_entry(&self, entry: &DirEntry) -> Option<FileEntry> {
        let path = entry.path();

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                log::trace!("Skipping unstattable file {}: {}", path.display(), e);
                return None;
            }
        };

        if let Err(e) = File::open(path) {
            log::trace!("Skipping unreadable file {}: {}", path.display(), e);
            return None;
        }

        Some(FileEntry::new(path.to_path_buf(), metadata.len()))
    }
}

/// Names starting with `.` are hidden.
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
