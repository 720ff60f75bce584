//! Metric index over fingerprints.
//!
//! A BK-tree keyed by the combined fingerprint distance. Every node owns one
//! [`Fingerprint`] and a map from edge distance to child subtree; lookups
//! prune whole subtrees with the triangle inequality, which keeps range
//! queries sub-quadratic on realistic collections while returning exactly
//! what a brute-force scan would.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::dedupe::fingerprint::Fingerprint;

#[derive(Debug)]
struct Node {
    item: Fingerprint,
    children: BTreeMap<u32, Node>,
}

impl Node {
    fn new(item: Fingerprint) -> Self {
        Self {
            item,
            children: BTreeMap::new(),
        }
    }
}

/// A BK-tree of fingerprints supporting range queries by combined distance.
///
/// Identical fingerprints are allowed; they chain beneath each other at edge
/// distance 0 and each counts toward [`len`](Self::len).
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    root: Option<Node>,
    len: usize,
}

impl FingerprintIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Insert a fingerprint.
    ///
    /// The first insertion becomes the root; every later item descends along
    /// the edge matching its distance to the current node until it finds a
    /// free slot.
    pub fn insert(&mut self, fingerprint: Fingerprint) {
        self.len += 1;

        let Some(root) = self.root.as_mut() else {
            self.root = Some(Node::new(fingerprint));
            return;
        };

        let mut node = root;
        loop {
            let d = node.item.distance(&fingerprint);
            match node.children.entry(d) {
                Entry::Vacant(slot) => {
                    slot.insert(Node::new(fingerprint));
                    return;
                }
                Entry::Occupied(slot) => {
                    node = slot.into_mut();
                }
            }
        }
    }

    /// All fingerprints within `threshold` of `query`, with their distances.
    ///
    /// Matches are unordered. The result set is exactly the set a linear
    /// scan over every stored fingerprint would produce at the same
    /// threshold.
    #[must_use]
    pub fn find_within(&self, query: &Fingerprint, threshold: u32) -> Vec<(&Fingerprint, u32)> {
        let mut matches = Vec::new();
        let mut pending = Vec::new();
        if let Some(root) = self.root.as_ref() {
            pending.push(root);
        }

        while let Some(node) = pending.pop() {
            let dist = node.item.distance(query);
            if dist <= threshold {
                matches.push((&node.item, dist));
            }

            // The combined distance halves a bit count with integer
            // division, so the triangle inequality can be off by one; the
            // descent window carries that extra unit or range queries would
            // skip live subtrees. Saturating arithmetic keeps the window
            // sound for thresholds far past any real distance.
            let slack = threshold.saturating_add(1);
            let lo = dist.saturating_sub(slack);
            let hi = dist.saturating_add(slack);
            for child in node.children.range(lo..=hi).map(|(_, child)| child) {
                pending.push(child);
            }
        }

        matches
    }

    /// Iterate over every stored fingerprint in pre-order (node first, then
    /// each child subtree in ascending edge order).
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            pending: self.root.as_ref().map(|root| vec![root]).unwrap_or_default(),
        }
    }

    /// Number of stored fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Pre-order iterator over an index.
pub struct Iter<'a> {
    pending: Vec<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Fingerprint;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.pending.pop()?;
        // Reversed so the smallest edge pops first.
        for child in node.children.values().rev() {
            self.pending.push(child);
        }
        Some(&node.item)
    }
}

impl<'a> IntoIterator for &'a FingerprintIndex {
    type Item = &'a Fingerprint;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
