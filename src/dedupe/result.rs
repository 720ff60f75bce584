//! Aggregated results of a deduplication run and the staged pipeline that
//! produces them.

use crate::dedupe::fingerprint::{
    compute_fingerprints, BatchOptions, Fingerprint, HashFailure, ImageFingerprinter,
};
use crate::dedupe::grouping::{self, find_duplicate_groups, DuplicateGroup, GroupingConfig};
use crate::scanner::FileEntry;

/// Everything one deduplication run found.
///
/// Groups carry the membership; counters derived from them (duplicate counts,
/// reclaimable bytes) are computed on demand rather than stored.
#[derive(Debug, Clone, Default)]
pub struct DedupeResult {
    /// Identical-tier groups, sorted by representative path.
    pub identical_groups: Vec<DuplicateGroup>,
    /// Similar-tier groups, sorted by representative path.
    pub similar_groups: Vec<DuplicateGroup>,
    /// Fingerprints that matched nothing.
    pub unmatched: Vec<Fingerprint>,
    /// Images that could not be fingerprinted.
    pub hash_failures: Vec<HashFailure>,
    /// Number of image files handed to the run.
    pub scanned_count: usize,
    /// True when a shutdown request cut hashing short; groups then cover
    /// only the files hashed before the cut.
    pub interrupted: bool,
}

impl DedupeResult {
    /// Total number of duplicate groups across both tiers.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.identical_groups.len() + self.similar_groups.len()
    }

    /// Total number of redundant copies across both tiers.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.groups().map(DuplicateGroup::duplicate_count).sum()
    }

    /// True when at least one duplicate group was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.group_count() > 0
    }

    /// Bytes freed by removing every identical-tier member.
    ///
    /// Similar-tier members are plausible keepers (crops, edits, exports),
    /// so they are not counted. Sizes come from a stat at call time; a
    /// member that no longer exists contributes 0.
    #[must_use]
    pub fn reclaimable_bytes(&self) -> u64 {
        self.identical_groups
            .iter()
            .flat_map(|group| &group.members)
            .map(|member| grouping::file_size(&member.path))
            .sum()
    }

    /// All groups, identical tier first.
    pub fn groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.identical_groups.iter().chain(&self.similar_groups)
    }
}

/// Run the full detection pipeline over scanned files.
///
/// Stages a "hashing" phase (batch fingerprinting, sequential or parallel
/// per `options`) and a "grouping" phase, bracketing each with the progress
/// callback. Per-item failures never abort the run; an interrupted hashing
/// batch still groups whatever was hashed and marks the result.
#[must_use]
pub fn deduplicate(
    files: &[FileEntry],
    fingerprinter: &ImageFingerprinter,
    config: &GroupingConfig,
    options: &BatchOptions,
) -> DedupeResult {
    let scanned_count = files.len();
    if scanned_count < 2 {
        log::info!("Nothing to compare: {scanned_count} image file(s)");
        return DedupeResult {
            scanned_count,
            ..DedupeResult::default()
        };
    }

    log::info!("Hashing {scanned_count} image file(s)");
    if let Some(ref callback) = options.progress {
        callback.on_phase_start("hashing", scanned_count);
    }
    let hashed = compute_fingerprints(files, fingerprinter, options);
    if let Some(ref callback) = options.progress {
        callback.on_phase_end("hashing");
    }
    log::info!(
        "Hashed {} file(s), {} failure(s)",
        hashed.fingerprints.len(),
        hashed.failures.len()
    );

    if let Some(ref callback) = options.progress {
        callback.on_phase_start("grouping", hashed.fingerprints.len());
    }
    let grouped = find_duplicate_groups(hashed.fingerprints, config);
    if let Some(ref callback) = options.progress {
        callback.on_phase_end("grouping");
    }

    DedupeResult {
        identical_groups: grouped.identical,
        similar_groups: grouped.similar,
        unmatched: grouped.unmatched,
        hash_failures: hashed.failures,
        scanned_count,
        interrupted: hashed.interrupted,
    }
}
