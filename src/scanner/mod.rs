//! Scanner module for directory traversal and file fingerprinting.
//!
//! This module provides functionality for:
//! - Collecting the candidate set of regular, readable files under a root
//! - Content fingerprinting with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and candidate collection
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let candidates = walker.collect().unwrap();
//! for file in candidates.iter() {
//!     println!("{}: {} bytes", file.path.display(), file.size);
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{files_identical, hash_to_hex, ContentHasher, Hash, Hasher, BLOCK_SIZE};
pub use walker::Walker;

/// A file discovered by the collector.
///
/// The fingerprint is not stored here; it lives in the detector's
/// [`FingerprintCache`](crate::duplicates::FingerprintCache), keyed by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes at collection time
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// The collected candidate files, in enumeration order.
///
/// Paths are unique: pushing a path that is already present is a no-op.
/// The order of insertion is the fixed enumeration order used by the
/// duplicate detector when it visits pairs.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    files: Vec<FileEntry>,
    seen: HashSet<PathBuf>,
}

impl CandidateSet {
    /// Create an empty candidate set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file. Returns `false` if the path was already present.
    pub fn insert(&mut self, entry: FileEntry) -> bool {
        if self.seen.contains(&entry.path) {
            return false;
        }
        self.seen.insert(entry.path.clone());
        self.files.push(entry);
        true
    }

    /// Number of candidate files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check whether a path is part of the set.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    /// Iterate over the files in enumeration order.
    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.files.iter()
    }

    /// Borrow the files as a slice, in enumeration order.
    #[must_use]
    pub fn as_slice(&self) -> &[FileEntry] {
        &self.files
    }

    /// Total size of all candidate files in bytes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

impl FromIterator<FileEntry> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = FileEntry>>(iter: I) -> Self {
        let mut set = Self::new();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Only walkdir's loop detection guards against symlink cycles.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Files never collected, such as the scan's own log file.
    /// Matched after canonicalization.
    pub excluded: Vec<PathBuf>,
}

impl WalkerConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(follow_symlinks: bool, skip_hidden: bool) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
            excluded: Vec::new(),
        }
    }

    /// Exclude `path` from the candidate set.
    #[must_use]
    pub fn with_excluded(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }
}

/// Fatal errors for the scan root.
///
/// Problems with individual entries below the root are never surfaced as
/// errors; those entries are skipped.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when listing the root.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing the root.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while opening the scan root.
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur while fingerprinting a single file.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file disappeared after it was collected.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(path) | Self::PermissionDenied(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}
