//! Per-run fingerprint cache.
//!
//! # Overview
//!
//! [`FingerprintCache`] maps a file path to the outcome of fingerprinting
//! it. Entries are filled on demand the first time a file takes part in a
//! comparison and are reused for the rest of the run, so every file is read
//! at most once. A failure is cached too: a file that could not be read is
//! never retried.
//!
//! The map sits behind an [`RwLock`], so fingerprint workers can share one
//! cache. Each path must be handed to a single worker; lookups from any
//! number of readers are safe. Nothing is persisted between runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::scanner::{ContentHasher, Hash, HashError};

/// What the cache remembers about a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Ready(Hash),
    Failed,
}

/// Result of [`FingerprintCache::get_or_compute`].
#[derive(Debug)]
pub enum CacheLookup {
    /// The fingerprint was already cached.
    Cached(Hash),
    /// The fingerprint was computed by this call.
    Computed(Hash),
    /// Fingerprinting failed during this call.
    Failed(HashError),
    /// Fingerprinting failed during an earlier call; not retried.
    KnownFailure,
}

/// Path to fingerprint mapping, populated lazily.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    entries: RwLock<HashMap<PathBuf, Slot>>,
}

impl FingerprintCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached fingerprint for `path`, computing it with `hasher`
    /// on a miss.
    pub fn get_or_compute(&self, path: &Path, hasher: &dyn ContentHasher) -> CacheLookup {
        if let Some(slot) = self.slot(path) {
            return match slot {
                Slot::Ready(hash) => CacheLookup::Cached(hash),
                Slot::Failed => CacheLookup::KnownFailure,
            };
        }

        // Hash outside the lock so other workers are not blocked on I/O.
        let result = hasher.full_hash(path);
        let slot = match &result {
            Ok(hash) => Slot::Ready(*hash),
            Err(_) => Slot::Failed,
        };

        if let Ok(mut entries) = self.entries.write() {
            entries.entry(path.to_path_buf()).or_insert(slot);
        }

        match result {
            Ok(hash) => CacheLookup::Computed(hash),
            Err(e) => CacheLookup::Failed(e),
        }
    }

    /// Record `path` as unreadable, replacing any cached fingerprint.
    ///
    /// Later lookups return [`CacheLookup::KnownFailure`].
    pub fn mark_failed(&self, path: &Path) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(path.to_path_buf(), Slot::Failed);
        }
    }

    /// Number of paths with a known outcome (success or failure).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, path: &Path) -> Option<Slot> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(path).copied())
    }
}
