//! Perceptual duplicate detection.
//!
//! This module provides:
//! - Fingerprint computation (two 64-bit perceptual hashes per image)
//! - A BK-tree metric index for range queries over fingerprints
//! - Transitive grouping of matches into identical and similar tiers
//! - Result aggregation and the staged detection pipeline

pub mod fingerprint;
pub mod grouping;
pub mod index;
pub mod result;

pub use fingerprint::{
    compute_fingerprints, compute_fingerprints_parallel, BatchOptions, Fingerprint,
    FingerprintError, HashFailure, HashingOutcome, ImageFingerprinter, MAX_DISTANCE,
};
pub use grouping::{
    find_duplicate_groups, DuplicateGroup, GroupingConfig, GroupingOutcome, SimilarityTier,
    DEFAULT_IDENTICAL_MAX, DEFAULT_SIMILAR_MAX,
};
pub use index::FingerprintIndex;
pub use result::{deduplicate, DedupeResult};
