//! Transitive duplicate grouping over fingerprint matches.
//!
//! # Overview
//!
//! Every fingerprint is queried against a fresh [`FingerprintIndex`] and the
//! resulting pairs are merged with two disjoint-set structures, one per
//! similarity tier. Pairwise matches alone would under-group chains (A≈B and
//! B≈C without a direct A≈C match); the union step closes the relation, so a
//! whole chain lands in one group. Identical-tier grouping takes precedence:
//! a path claimed by an identical group never reappears in a similar group.
//!
//! # Example
//!
//! ```
//! use photosieve::dedupe::{find_duplicate_groups, Fingerprint, GroupingConfig};
//! use std::path::PathBuf;
//!
//! let fingerprints = vec![
//!     Fingerprint::new(0, 0, PathBuf::from("/photos/a.png")),
//!     Fingerprint::new(0, 0, PathBuf::from("/photos/b.png")),
//!     Fingerprint::new(u64::MAX, u64::MAX, PathBuf::from("/photos/other.png")),
//! ];
//!
//! let outcome = find_duplicate_groups(fingerprints, &GroupingConfig::default());
//! assert_eq!(outcome.identical.len(), 1);
//! assert_eq!(outcome.identical[0].size(), 2);
//! assert_eq!(outcome.unmatched.len(), 1);
//! ```

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dedupe::fingerprint::{Fingerprint, MAX_DISTANCE};
use crate::dedupe::index::FingerprintIndex;

/// Default upper bound for the identical tier.
pub const DEFAULT_IDENTICAL_MAX: u32 = 5;

/// Default upper bound for the similar tier.
pub const DEFAULT_SIMILAR_MAX: u32 = 12;

/// Distance thresholds for the two duplicate tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Combined distance at or below which two images count as identical.
    pub identical_max: u32,
    /// Combined distance at or below which two images count as similar.
    /// Must be greater than `identical_max`.
    pub similar_max: u32,
}

impl GroupingConfig {
    /// Create a config from explicit thresholds.
    #[must_use]
    pub fn new(identical_max: u32, similar_max: u32) -> Self {
        Self {
            identical_max,
            similar_max,
        }
    }

    /// True when the thresholds are ordered and within the distance range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.identical_max < self.similar_max && self.similar_max <= MAX_DISTANCE
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            identical_max: DEFAULT_IDENTICAL_MAX,
            similar_max: DEFAULT_SIMILAR_MAX,
        }
    }
}

/// Which threshold band a duplicate group was formed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityTier {
    /// Visually identical or near-identical copies.
    Identical,
    /// Resized, re-encoded, or lightly edited variants.
    Similar,
}

impl fmt::Display for SimilarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identical => write!(f, "identical"),
            Self::Similar => write!(f, "similar"),
        }
    }
}

/// A cluster of mutually duplicate images.
///
/// The representative is the member kept in place: the largest file by size,
/// ties broken by lexical path order. `members` never includes the
/// representative and is never empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The member chosen to keep.
    pub representative: Fingerprint,
    /// Remaining members, largest file first.
    pub members: Vec<Fingerprint>,
    /// Threshold band this group was formed in.
    pub tier: SimilarityTier,
    /// Mean of the pairwise distances recorded while matching this cluster.
    pub mean_distance: f64,
}

impl DuplicateGroup {
    /// Total number of images in the group, representative included.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.members.len()
    }

    /// Number of redundant copies (everything except the representative).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.members.len()
    }

    /// Paths of every image in the group, representative first.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        std::iter::once(self.representative.path.clone())
            .chain(self.members.iter().map(|m| m.path.clone()))
            .collect()
    }
}

/// What one grouping run produced.
#[derive(Debug, Default)]
pub struct GroupingOutcome {
    /// Identical-tier groups, sorted by representative path.
    pub identical: Vec<DuplicateGroup>,
    /// Similar-tier groups, sorted by representative path.
    pub similar: Vec<DuplicateGroup>,
    /// Fingerprints that joined no group, in input order.
    pub unmatched: Vec<Fingerprint>,
}

/// Group fingerprints into identical and similar duplicate clusters.
///
/// Consumes the fingerprints; grouped ones are cloned into their groups and
/// the rest are moved into `unmatched`. Fewer than two inputs short-circuit
/// with everything unmatched.
#[must_use]
pub fn find_duplicate_groups(
    fingerprints: Vec<Fingerprint>,
    config: &GroupingConfig,
) -> GroupingOutcome {
    debug_assert!(
        config.is_valid(),
        "grouping thresholds must satisfy identical_max < similar_max <= 64"
    );

    if fingerprints.len() < 2 {
        return GroupingOutcome {
            unmatched: fingerprints,
            ..GroupingOutcome::default()
        };
    }

    let mut index = FingerprintIndex::new();
    for fp in &fingerprints {
        index.insert(fp.clone());
    }
    log::debug!("Indexed {} fingerprints", index.len());

    let index_of: HashMap<&Path, usize> = fingerprints
        .iter()
        .enumerate()
        .map(|(i, fp)| (fp.path.as_path(), i))
        .collect();

    let mut identical_sets = UnionFind::new(fingerprints.len());
    let mut similar_sets = UnionFind::new(fingerprints.len());
    let mut distances: HashMap<(usize, usize), u32> = HashMap::new();

    for (i, fp) in fingerprints.iter().enumerate() {
        for (other, d) in index.find_within(fp, config.similar_max) {
            if other.path == fp.path {
                continue;
            }
            let Some(&j) = index_of.get(other.path.as_path()) else {
                continue;
            };

            distances.insert(pair_key(i, j), d);
            if d <= config.identical_max {
                identical_sets.union(i, j);
            } else {
                similar_sets.union(i, j);
            }
        }
    }

    let mut assigned: HashSet<usize> = HashSet::new();
    let identical = build_tier(
        &fingerprints,
        &mut identical_sets,
        &distances,
        SimilarityTier::Identical,
        &mut assigned,
    );
    let similar = build_tier(
        &fingerprints,
        &mut similar_sets,
        &distances,
        SimilarityTier::Similar,
        &mut assigned,
    );

    log::info!(
        "Grouping found {} identical and {} similar group(s) among {} fingerprints",
        identical.len(),
        similar.len(),
        fingerprints.len()
    );

    let unmatched: Vec<Fingerprint> = fingerprints
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !assigned.contains(i))
        .map(|(_, fp)| fp)
        .collect();

    GroupingOutcome {
        identical,
        similar,
        unmatched,
    }
}

/// Extract size-2+ components of one tier into groups, skipping fingerprints
/// already claimed by an earlier tier.
fn build_tier(
    fingerprints: &[Fingerprint],
    sets: &mut UnionFind,
    distances: &HashMap<(usize, usize), u32>,
    tier: SimilarityTier,
    assigned: &mut HashSet<usize>,
) -> Vec<DuplicateGroup> {
    let mut components: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..fingerprints.len() {
        if assigned.contains(&i) {
            continue;
        }
        components.entry(sets.find(i)).or_default().push(i);
    }

    let mut groups = Vec::new();
    for indices in components.into_values() {
        if indices.len() < 2 {
            continue;
        }

        let mean_distance = mean_distance(&indices, distances);

        // Largest file wins representative; sizes come from a stat at build
        // time, 0 when the file is gone.
        let mut sized: Vec<(u64, usize)> = indices
            .iter()
            .map(|&i| (file_size(&fingerprints[i].path), i))
            .collect();
        sized.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| fingerprints[a.1].path.cmp(&fingerprints[b.1].path))
        });

        let mut ordered = sized.into_iter().map(|(_, i)| i);
        let Some(rep) = ordered.next() else {
            continue;
        };
        let members: Vec<Fingerprint> = ordered.map(|i| fingerprints[i].clone()).collect();

        assigned.extend(indices.iter().copied());
        log::trace!(
            "{tier} group of {} anchored at {}",
            members.len() + 1,
            fingerprints[rep].path.display()
        );
        groups.push(DuplicateGroup {
            representative: fingerprints[rep].clone(),
            members,
            tier,
            mean_distance,
        });
    }

    groups.sort_by(|a, b| a.representative.path.cmp(&b.representative.path));
    groups
}

/// Order-independent key for a pair of fingerprint indices.
fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Mean of the recorded pairwise distances among `indices` (0 when none).
fn mean_distance(indices: &[usize], distances: &HashMap<(usize, usize), u32>) -> f64 {
    let mut sum = 0u64;
    let mut count = 0u64;
    for (pos, &i) in indices.iter().enumerate() {
        for &j in &indices[pos + 1..] {
            if let Some(&d) = distances.get(&pair_key(i, j)) {
                sum += u64::from(d);
                count += 1;
            }
        }
    }
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

pub(crate) fn file_size(path: &Path) -> u64 {
    match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(err) => {
            log::debug!("Could not stat {}: {err}", path.display());
            0
        }
    }
}

/// Array-backed disjoint-set with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Second pass points the whole chain at the root.
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            Ordering::Less => self.parent[ra] = rb,
            Ordering::Greater => self.parent[rb] = ra,
            Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}
