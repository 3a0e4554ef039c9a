//! Duplicate detection over a collected candidate set.
//!
//! # Overview
//!
//! [`DuplicateFinder`] compares the fingerprints of candidate pairs:
//! 1. **Plan** - decide which pairs to compare (size buckets by default,
//!    see [`ComparisonPlan`])
//! 2. **Prefetch** - optionally fingerprint every participating file on a
//!    rayon pool (`io_threads > 1`)
//! 3. **Compare** - visit pairs in enumeration order; each fingerprint is
//!    computed the first time its file is compared and cached for the rest
//!    of the run
//!
//! Hash equality is trusted unless paranoid mode is on, in which case
//! matches are confirmed byte-for-byte.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let (pairs, summary) = finder.find_duplicates_in(Path::new(".")).unwrap();
//!
//! for pair in &pairs {
//!     println!("{} == {}", pair.first.display(), pair.second.display());
//! }
//! println!("{} comparisons", summary.comparisons_performed);
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::{
    group_pairs, CacheLookup, ComparisonPlan, DuplicateGroup, DuplicatePair, FingerprintCache,
};
use crate::progress::{ComparisonProgress, LatencyTracker, Phase, ProgressCallback};
use crate::scanner::{
    files_identical, hash_to_hex, CandidateSet, ContentHasher, FileEntry, Hash, HashError, Hasher,
    ScanError, Walker, WalkerConfig,
};

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Fingerprint workers. 1 hashes lazily on the comparing thread.
    pub io_threads: usize,
    /// Only compare files of equal size.
    pub size_filter: bool,
    /// Confirm fingerprint matches byte-for-byte (paranoid mode).
    pub paranoid: bool,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("size_filter", &self.size_filter)
            .field("paranoid", &self.paranoid)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 1,
            size_filter: true,
            paranoid: false,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of fingerprint workers (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Enable or disable the size pre-filter.
    #[must_use]
    pub fn with_size_filter(mut self, enabled: bool) -> Self {
        self.size_filter = enabled;
        self
    }

    /// Enable paranoid mode (byte-by-byte confirmation).
    #[must_use]
    pub fn with_paranoid(mut self, enabled: bool) -> Self {
        self.paranoid = enabled;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
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
}

/// Statistics from one detection run.
#[derive(Debug, Default)]
pub struct DetectionSummary {
    /// Files in the candidate set
    pub candidates: usize,
    /// Pairwise comparisons the plan called for
    pub comparisons_planned: usize,
    /// Candidates whose comparisons with all later peers are done
    pub files_checked: usize,
    /// Comparisons where both fingerprints were available
    pub comparisons_performed: usize,
    /// Comparisons skipped because a file could not be read
    pub comparisons_skipped: usize,
    /// Files read and hashed
    pub files_fingerprinted: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Files that could not be read, each counted once
    pub failed_files: usize,
    /// One read error per failed file, in the order they occurred
    pub errors: Vec<HashError>,
    /// Duplicate pairs reported
    pub duplicate_pairs: usize,
    /// Equivalence classes among the reported pairs
    pub groups: Vec<DuplicateGroup>,
    /// Fingerprint matches rejected by byte-for-byte confirmation
    pub collisions_rejected: usize,
    /// Mean latency of a single comparison
    pub average_comparison: Duration,
    /// Wall time of the detection phase
    pub elapsed: Duration,
    /// Whether detection stopped early on a shutdown request
    pub interrupted: bool,
}

impl DetectionSummary {
    /// Comparisons not reached (non-zero only when interrupted).
    #[must_use]
    pub fn remaining_comparisons(&self) -> usize {
        self.comparisons_planned
            .saturating_sub(self.comparisons_performed + self.comparisons_skipped)
    }

    /// Remaining comparisons times the mean comparison latency.
    #[must_use]
    pub fn estimated_remaining(&self) -> Duration {
        self.average_comparison
            .saturating_mul(u32::try_from(self.remaining_comparisons()).unwrap_or(u32::MAX))
    }

    /// Bytes hashed as a human-readable string.
    #[must_use]
    pub fn bytes_hashed_display(&self) -> String {
        ByteSize(self.bytes_hashed).to_string()
    }
}

/// Errors that can end a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted before detection started.
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The scan root was unusable.
    #[error(transparent)]
    ScanError(#[from] ScanError),
}

/// Runs the collector and the pairwise fingerprint comparison.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<dyn ContentHasher>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder using the BLAKE3 [`Hasher`].
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self::with_hasher(config, Arc::new(Hasher::new()))
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Create a finder that fingerprints through `hasher`.
    #[must_use]
    pub fn with_hasher(config: FinderConfig, hasher: Arc<dyn ContentHasher>) -> Self {
        Self { config, hasher }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Collect the candidate set under `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ScanError`] for a bad root and
    /// [`FinderError::Interrupted`] if shutdown was requested during the
    /// walk.
    pub fn collect(&self, path: &Path) -> Result<CandidateSet, FinderError> {
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!("Starting duplicate scan of {}", path.display());

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(Phase::Collecting, 0);
        }

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(callback.clone());
        }

        let result = walker.collect();

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(Phase::Collecting);
        }

        let candidates = result?;
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        Ok(candidates)
    }

    /// Collect candidates under `path` and find their duplicates.
    ///
    /// # Errors
    ///
    /// See [`DuplicateFinder::collect`].
    pub fn find_duplicates_in(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicatePair>, DetectionSummary), FinderError> {
        let candidates = self.collect(path)?;
        Ok(self.find_duplicates(&candidates))
    }

    /// Compare every planned pair of `candidates`.
    ///
    /// Pairs are returned, and logged at info, in enumeration order. Files
    /// that cannot be read are recorded in the summary and their
    /// comparisons are skipped. A shutdown request stops the loop between
    /// comparisons and sets [`DetectionSummary::interrupted`].
    #[must_use]
    pub fn find_duplicates(&self, candidates: &CandidateSet) -> (Vec<DuplicatePair>, DetectionSummary) {
        let start_time = Instant::now();
        let files = candidates.as_slice();
        let plan = if self.config.size_filter {
            ComparisonPlan::by_size(files)
        } else {
            ComparisonPlan::exhaustive(files.len())
        };
        let total = plan.total_comparisons();

        let mut summary = DetectionSummary {
            candidates: files.len(),
            comparisons_planned: total,
            ..Default::default()
        };
        let mut pairs = Vec::new();
        let cache = FingerprintCache::new();

        log::info!(
            "Comparing {} candidate file(s): {} comparison(s) planned",
            files.len(),
            total
        );

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(Phase::Detecting, total);
        }

        if self.config.io_threads > 1 && total > 0 {
            self.prefetch(files, &plan, &cache, &mut summary);
        }

        let mut tracker = LatencyTracker::new();
        let mut done = 0usize;

        'outer: for (idx, file) in files.iter().enumerate() {
            for &peer in plan.peers(idx) {
                if self.config.is_shutdown_requested() {
                    log::info!(
                        "Detection interrupted after {} of {} comparison(s)",
                        done,
                        total
                    );
                    summary.interrupted = true;
                    break 'outer;
                }

                let started = Instant::now();
                let target = &files[peer];
                let left = self.fingerprint(&cache, file, &mut summary);
                let right = self.fingerprint(&cache, target, &mut summary);

                let identical = match (left, right) {
                    (Some(a), Some(b)) if a == b => self
                        .confirm(&cache, file, target, &mut summary)
                        .map(|same| same.then_some(a)),
                    (Some(_), Some(_)) => Some(None),
                    _ => None,
                };

                match identical {
                    Some(Some(hash)) => {
                        summary.comparisons_performed += 1;
                        log::info!(
                            "{} is a duplicate of {}",
                            file.path.display(),
                            target.path.display()
                        );
                        pairs.push(DuplicatePair {
                            first: file.path.clone(),
                            second: target.path.clone(),
                            hash,
                            size: file.size,
                        });
                    }
                    Some(None) => summary.comparisons_performed += 1,
                    None => summary.comparisons_skipped += 1,
                }

                tracker.record(started.elapsed());
                done += 1;

                if let Some(ref callback) = self.config.progress_callback {
                    callback.on_comparison(&ComparisonProgress {
                        done,
                        total,
                        average: tracker.average(),
                        eta: tracker.eta(total - done),
                    });
                }
            }
            summary.files_checked = idx + 1;
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(Phase::Detecting);
        }

        summary.duplicate_pairs = pairs.len();
        summary.groups = group_pairs(&pairs);
        summary.average_comparison = tracker.average();
        summary.elapsed = start_time.elapsed();

        log::info!(
            "Detection complete: {} of {} file(s) checked, {} duplicate pair(s) in {} group(s), {} file(s) hashed ({}), {} failed",
            summary.files_checked,
            summary.candidates,
            summary.duplicate_pairs,
            summary.groups.len(),
            summary.files_fingerprinted,
            summary.bytes_hashed_display(),
            summary.failed_files
        );

        (pairs, summary)
    }

    /// Look up or compute the fingerprint of `file`, updating the summary.
    fn fingerprint(
        &self,
        cache: &FingerprintCache,
        file: &FileEntry,
        summary: &mut DetectionSummary,
    ) -> Option<Hash> {
        let lookup = cache.get_or_compute(&file.path, self.hasher.as_ref());
        Self::record_lookup(file, lookup, summary)
    }

    fn record_lookup(
        file: &FileEntry,
        lookup: CacheLookup,
        summary: &mut DetectionSummary,
    ) -> Option<Hash> {
        match lookup {
            CacheLookup::Cached(hash) => Some(hash),
            CacheLookup::Computed(hash) => {
                summary.files_fingerprinted += 1;
                summary.bytes_hashed += file.size;
                log::trace!(
                    "Fingerprint {}: {}",
                    hash_to_hex(&hash),
                    file.path.display()
                );
                Some(hash)
            }
            CacheLookup::Failed(e) => {
                log::warn!("Failed to fingerprint {}: {}", file.path.display(), e);
                summary.failed_files += 1;
                summary.errors.push(e);
                None
            }
            CacheLookup::KnownFailure => None,
        }
    }

    /// Byte-for-byte confirmation of a fingerprint match.
    ///
    /// Always `Some(true)` unless paranoid mode is on. `None` means one of
    /// the files could no longer be read; that file is marked failed in the
    /// cache so its remaining comparisons are skipped.
    fn confirm(
        &self,
        cache: &FingerprintCache,
        a: &FileEntry,
        b: &FileEntry,
        summary: &mut DetectionSummary,
    ) -> Option<bool> {
        if !self.config.paranoid {
            return Some(true);
        }

        match files_identical(&a.path, &b.path) {
            Ok(true) => Some(true),
            Ok(false) => {
                log::warn!(
                    "Hash collision: {} and {} share a fingerprint but differ in content",
                    a.path.display(),
                    b.path.display()
                );
                summary.collisions_rejected += 1;
                Some(false)
            }
            Err(e) => {
                log::warn!(
                    "Could not confirm {} against {}: {}",
                    a.path.display(),
                    b.path.display(),
                    e
                );
                cache.mark_failed(e.path());
                summary.failed_files += 1;
                summary.errors.push(e);
                None
            }
        }
    }

    /// Fingerprint every participating file on a worker pool.
    ///
    /// Each path is handed to exactly one worker, so each cache key has a
    /// single writer. The comparison loop afterwards only reads the cache.
    fn prefetch(
        &self,
        files: &[FileEntry],
        plan: &ComparisonPlan,
        cache: &FingerprintCache,
        summary: &mut DetectionSummary,
    ) {
        let participants: Vec<&FileEntry> =
            plan.participants().into_iter().map(|idx| &files[idx]).collect();

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!("Failed to create fingerprint thread pool, hashing lazily: {}", e);
                return;
            }
        };

        log::debug!(
            "Prefetching {} fingerprint(s) on {} thread(s)",
            participants.len(),
            self.config.io_threads
        );

        let hasher = self.hasher.as_ref();
        let config = &self.config;
        let outcomes: Vec<(&FileEntry, CacheLookup)> = pool.install(|| {
            participants
                .par_iter()
                .filter_map(|file| {
                    if config.is_shutdown_requested() {
                        return None;
                    }
                    Some((*file, cache.get_or_compute(&file.path, hasher)))
                })
                .collect()
        });

        for (file, lookup) in outcomes {
            Self::record_lookup(file, lookup, summary);
        }
    }
}
