//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Comparison planning with the size pre-filter
//! - Per-run fingerprint caching
//! - Pairwise fingerprint comparison
//! - Duplicate group management

pub mod cache;
pub mod finder;
pub mod groups;

pub use cache::{CacheLookup, FingerprintCache};
pub use finder::{DetectionSummary, DuplicateFinder, FinderConfig, FinderError};
pub use groups::{group_pairs, ComparisonPlan, DuplicateGroup, DuplicatePair};
