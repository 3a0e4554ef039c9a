//! Comparison planning and duplicate grouping.
//!
//! # Overview
//!
//! Before any file is read, [`ComparisonPlan`] decides which pairs the
//! detector will compare. With the size pre-filter, files are bucketed by
//! exact size since files of different sizes cannot be duplicates; without
//! it, every file is compared with every later file. Either way, the pairs
//! of a file are the later members of its bucket, so visiting files in
//! enumeration order and then their peers yields pairs in `(i, j)` order.
//!
//! After detection, [`group_pairs`] folds the reported pairs into
//! [`DuplicateGroup`]s.
//!
//! # Example
//!
//! ```
//! use dupescan::scanner::FileEntry;
//! use dupescan::duplicates::ComparisonPlan;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let plan = ComparisonPlan::by_size(&files);
//! assert_eq!(plan.total_comparisons(), 1);
//! assert_eq!(plan.peers(0), &[1]);
//! assert!(plan.peers(2).is_empty());
//!
//! let exhaustive = ComparisonPlan::exhaustive(files.len());
//! assert_eq!(exhaustive.total_comparisons(), 3);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::scanner::{hash_to_hex, FileEntry, Hash};

/// Which pairs of candidates get compared.
#[derive(Debug, Clone, Default)]
pub struct ComparisonPlan {
    /// Candidate indices per bucket, ascending.
    buckets: Vec<Vec<usize>>,
    /// For each candidate: (bucket, position within bucket).
    slots: Vec<(usize, usize)>,
}

impl ComparisonPlan {
    /// Bucket candidates by exact size.
    #[must_use]
    pub fn by_size(files: &[FileEntry]) -> Self {
        let mut bucket_of_size: HashMap<u64, usize> = HashMap::new();
        let mut buckets: Vec<Vec<usize>> = Vec::new();
        let mut slots = Vec::with_capacity(files.len());

        for (idx, file) in files.iter().enumerate() {
            let bucket = *bucket_of_size.entry(file.size).or_insert_with(|| {
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            slots.push((bucket, buckets[bucket].len()));
            buckets[bucket].push(idx);
        }

        let plan = Self { buckets, slots };
        log::debug!(
            "Size pre-filter: {} files in {} size bucket(s), {} comparison(s), {} file(s) eliminated",
            files.len(),
            plan.buckets.len(),
            plan.total_comparisons(),
            plan.eliminated()
        );
        plan
    }

    /// Compare every candidate with every later candidate.
    #[must_use]
    pub fn exhaustive(count: usize) -> Self {
        if count == 0 {
            return Self::default();
        }
        Self {
            buckets: vec![(0..count).collect()],
            slots: (0..count).map(|idx| (0, idx)).collect(),
        }
    }

    /// Number of candidates covered by the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the plan covers no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Later candidates that `idx` is compared with, ascending.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not a candidate index of this plan.
    #[must_use]
    pub fn peers(&self, idx: usize) -> &[usize] {
        let (bucket, position) = self.slots[idx];
        &self.buckets[bucket][position + 1..]
    }

    /// Total number of pairwise comparisons.
    #[must_use]
    pub fn total_comparisons(&self) -> usize {
        self.buckets
            .iter()
            .map(|b| b.len() * b.len().saturating_sub(1) / 2)
            .sum()
    }

    /// Candidates that take part in at least one comparison, ascending.
    #[must_use]
    pub fn participants(&self) -> Vec<usize> {
        let mut participants: Vec<usize> = self
            .buckets
            .iter()
            .filter(|b| b.len() > 1)
            .flatten()
            .copied()
            .collect();
        participants.sort_unstable();
        participants
    }

    /// Candidates alone in their bucket, which are never read.
    #[must_use]
    pub fn eliminated(&self) -> usize {
        self.buckets.iter().filter(|b| b.len() == 1).count()
    }
}

/// Two distinct files with matching fingerprints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePair {
    /// The file earlier in enumeration order
    pub first: PathBuf,
    /// The file later in enumeration order
    pub second: PathBuf,
    /// Shared fingerprint
    pub hash: Hash,
    /// Shared size in bytes
    pub size: u64,
}

/// Files sharing one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// BLAKE3 hash of the content
    pub hash: Hash,
    /// Size of each file in bytes
    pub size: u64,
    /// Members, in enumeration order
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of copies beyond the first.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Space taken by the copies beyond the first.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Hash as a hex string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }
}

/// Fold duplicate pairs into groups, one per fingerprint.
///
/// Groups are ordered by their first member, and members keep the order in
/// which they first appear in `pairs`. Runs in time linear in `pairs`.
#[must_use]
pub fn group_pairs(pairs: &[DuplicatePair]) -> Vec<DuplicateGroup> {
    let mut index: HashMap<Hash, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut members: Vec<HashSet<&Path>> = Vec::new();

    for pair in pairs {
        let idx = *index.entry(pair.hash).or_insert_with(|| {
            groups.push(DuplicateGroup {
                hash: pair.hash,
                size: pair.size,
                files: Vec::new(),
            });
            members.push(HashSet::new());
            groups.len() - 1
        });

        for path in [&pair.first, &pair.second] {
            if members[idx].insert(path.as_path()) {
                groups[idx].files.push(path.clone());
            }
        }
    }

    for group in &groups {
        log::debug!(
            "Duplicate group {}: {} files, {} bytes each",
            group.hash_hex(),
            group.len(),
            group.size
        );
    }

    groups
}
