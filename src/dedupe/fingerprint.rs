//! Image fingerprints and their computation.
//!
//! A [`Fingerprint`] condenses an image into two independent 64-bit
//! perceptual hashes: a DCT (frequency-domain) hash that survives
//! re-encoding and resizing, and a gradient hash that tracks local
//! structure. The combined distance averages the Hamming distances of the
//! two families, so images only count as close when both families agree.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig, ImageHash};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::ProgressCallback;
use crate::scanner::FileEntry;

/// Upper bound of the combined distance between two fingerprints.
pub const MAX_DISTANCE: u32 = 64;

/// A perceptual summary of one image, bound to its resolved path.
///
/// Immutable value type; equality is bitwise over both hashes and the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// DCT-based hash, robust to compression and scaling.
    pub dct_hash: u64,
    /// Row-gradient hash, sensitive to structural edits.
    pub gradient_hash: u64,
    /// Absolute path of the source image.
    pub path: PathBuf,
}

impl Fingerprint {
    /// Create a fingerprint from raw hash patterns and a path.
    #[must_use]
    pub fn new(dct_hash: u64, gradient_hash: u64, path: PathBuf) -> Self {
        Self {
            dct_hash,
            gradient_hash,
            path,
        }
    }

    /// Combined distance to another fingerprint.
    ///
    /// Averages the Hamming distances of the two hash families with integer
    /// division, yielding `0..=64`. Symmetric; `0` means the two patterns
    /// differ in at most one bit across both families.
    #[must_use]
    pub fn distance(&self, other: &Fingerprint) -> u32 {
        let dct = (self.dct_hash ^ other.dct_hash).count_ones();
        let gradient = (self.gradient_hash ^ other.gradient_hash).count_ones();
        (dct + gradient) / 2
    }

    /// DCT hash as a 16-digit hex string.
    #[must_use]
    pub fn dct_hex(&self) -> String {
        format!("{:016x}", self.dct_hash)
    }

    /// Gradient hash as a 16-digit hex string.
    #[must_use]
    pub fn gradient_hex(&self) -> String {
        format!("{:016x}", self.gradient_hash)
    }
}

/// Errors that can occur while fingerprinting a single image.
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// The file could not be opened or decoded as an image.
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        /// Path of the offending file
        path: PathBuf,
        /// Decoder error
        #[source]
        source: image::ImageError,
    },

    /// The file could not be read or its path resolved.
    #[error("Failed to read image {path}: {source}")]
    Io {
        /// Path of the offending file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl FingerprintError {
    /// Path of the file that failed to fingerprint.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Decode { path, .. } | Self::Io { path, .. } => path,
        }
    }
}

/// A recorded per-item hashing failure, surfaced in the batch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashFailure {
    /// Path of the image that could not be fingerprinted.
    pub path: PathBuf,
    /// Human-readable reason.
    pub reason: String,
}

impl HashFailure {
    fn from_error(path: PathBuf, error: &FingerprintError) -> Self {
        Self {
            path,
            reason: error.to_string(),
        }
    }
}

/// Computes fingerprints for images.
///
/// Holds one configured hasher per family; cheap to share across threads.
pub struct ImageFingerprinter {
    dct_hasher: image_hasher::Hasher,
    gradient_hasher: image_hasher::Hasher,
}

impl ImageFingerprinter {
    /// Create a fingerprinter with the standard 8x8 hash configuration.
    #[must_use]
    pub fn new() -> Self {
        let dct_hasher = HasherConfig::new()
            .hash_size(8, 8)
            .hash_alg(HashAlg::Median)
            .preproc_dct()
            .to_hasher();
        let gradient_hasher = HasherConfig::new()
            .hash_size(8, 8)
            .hash_alg(HashAlg::Gradient)
            .to_hasher();

        Self {
            dct_hasher,
            gradient_hasher,
        }
    }

    /// Fingerprint the image at `path`.
    ///
    /// The path is resolved to its canonical absolute form and the
    /// fingerprint is bound to that resolved path.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::Io`] if the path cannot be resolved and
    /// [`FingerprintError::Decode`] if the file is not a readable image.
    pub fn fingerprint_path(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        let resolved = fs::canonicalize(path).map_err(|e| FingerprintError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let img = image::open(&resolved).map_err(|e| FingerprintError::Decode {
            path: resolved.clone(),
            source: e,
        })?;

        Ok(self.fingerprint_image(&img, resolved))
    }

    /// Fingerprint an already-decoded image.
    ///
    /// The image is normalized to 3-channel RGB first, so the resulting
    /// hashes do not depend on the source color mode (grayscale, palette,
    /// alpha).
    #[must_use]
    pub fn fingerprint_image(&self, image: &DynamicImage, path: PathBuf) -> Fingerprint {
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

        Fingerprint {
            dct_hash: pack_bits(&self.dct_hasher.hash_image(&rgb)),
            gradient_hash: pack_bits(&self.gradient_hasher.hash_image(&rgb)),
            path,
        }
    }
}

impl Default for ImageFingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Pack an 8-byte image hash into a big-endian u64.
fn pack_bits(hash: &ImageHash) -> u64 {
    let mut buf = [0u8; 8];
    for (slot, byte) in buf.iter_mut().zip(hash.as_bytes()) {
        *slot = *byte;
    }
    u64::from_be_bytes(buf)
}

/// Options for batch fingerprinting.
#[derive(Clone, Default)]
pub struct BatchOptions {
    /// Optional progress callback, invoked once per processed item.
    pub progress: Option<Arc<dyn ProgressCallback>>,
    /// Cooperative shutdown flag, checked between items.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Hash across the rayon pool instead of sequentially.
    pub parallel: bool,
}

impl BatchOptions {
    /// Create options with no progress reporting, no shutdown flag, and
    /// sequential hashing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Attach a shared shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Enable or disable parallel hashing.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn report(&self, done: usize, total: usize) {
        if let Some(ref callback) = self.progress {
            callback.on_progress(done, total);
        }
    }
}

/// Result of fingerprinting a batch of files.
#[derive(Debug, Default)]
pub struct HashingOutcome {
    /// Successful fingerprints, in input order.
    pub fingerprints: Vec<Fingerprint>,
    /// Per-item failures, in input order.
    pub failures: Vec<HashFailure>,
    /// True when the shutdown flag cut the batch short.
    pub interrupted: bool,
}

enum ItemOutcome {
    Hashed(Fingerprint),
    Failed(HashFailure),
    Skipped,
}

/// Fingerprint every file in `files`.
///
/// Failures are collected, never fatal: a file that cannot be decoded is
/// excluded from comparison and reported in the outcome. Successes keep the
/// input order. The progress callback fires synchronously after each item;
/// the shutdown flag is honored between items.
#[must_use]
pub fn compute_fingerprints(
    files: &[FileEntry],
    fingerprinter: &ImageFingerprinter,
    options: &BatchOptions,
) -> HashingOutcome {
    if options.parallel {
        return compute_fingerprints_parallel(files, fingerprinter, options);
    }

    let total = files.len();
    let mut outcome = HashingOutcome::default();

    for (idx, entry) in files.iter().enumerate() {
        if options.is_shutdown_requested() {
            log::info!("Hashing interrupted after {idx} of {total} files");
            outcome.interrupted = true;
            break;
        }

        match hash_one(entry, fingerprinter) {
            ItemOutcome::Hashed(fp) => outcome.fingerprints.push(fp),
            ItemOutcome::Failed(failure) => outcome.failures.push(failure),
            ItemOutcome::Skipped => {}
        }

        options.report(idx + 1, total);
    }

    outcome
}

/// Parallel variant of [`compute_fingerprints`].
///
/// Observable results match the sequential variant: successes and failures
/// come back in input order. Progress is reported from worker threads as a
/// monotonic completion count rather than an input position.
#[must_use]
pub fn compute_fingerprints_parallel(
    files: &[FileEntry],
    fingerprinter: &ImageFingerprinter,
    options: &BatchOptions,
) -> HashingOutcome {
    let total = files.len();
    let completed = AtomicUsize::new(0);

    let items: Vec<ItemOutcome> = files
        .par_iter()
        .map(|entry| {
            if options.is_shutdown_requested() {
                return ItemOutcome::Skipped;
            }

            let item = hash_one(entry, fingerprinter);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            options.report(done, total);
            item
        })
        .collect();

    let mut outcome = HashingOutcome::default();
    for item in items {
        match item {
            ItemOutcome::Hashed(fp) => outcome.fingerprints.push(fp),
            ItemOutcome::Failed(failure) => outcome.failures.push(failure),
            ItemOutcome::Skipped => outcome.interrupted = true,
        }
    }

    if outcome.interrupted {
        log::info!(
            "Hashing interrupted after {} of {total} files",
            completed.load(Ordering::SeqCst)
        );
    }

    outcome
}

fn hash_one(entry: &FileEntry, fingerprinter: &ImageFingerprinter) -> ItemOutcome {
    match fingerprinter.fingerprint_path(&entry.path) {
        Ok(fp) => {
            log::trace!("Fingerprinted {}", fp.path.display());
            ItemOutcome::Hashed(fp)
        }
        Err(err) => {
            log::warn!("Skipping {}: {err}", entry.path.display());
            ItemOutcome::Failed(HashFailure::from_error(entry.path.clone(), &err))
        }
    }
}
