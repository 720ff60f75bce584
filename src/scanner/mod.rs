//! Scanner module for discovering image files.
//!
//! The scanner realizes the input side of the pipeline: it walks a
//! directory tree, classifies regular files by extension, and hands an
//! ordered list of [`FileEntry`] descriptors to fingerprinting. No file
//! contents are read here; validity is decided later, when decoding.
//!
//! # Example
//!
//! ```no_run
//! use photosieve::scanner::{scan_directory, ScanOptions};
//! use std::path::Path;
//!
//! let outcome = scan_directory(Path::new("/photos"), &ScanOptions::default())?;
//! for entry in &outcome.images {
//!     println!("{}: {} bytes", entry.path.display(), entry.size);
//! }
//! # Ok::<(), photosieve::scanner::ScanError>(())
//! ```

pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export main types
pub use walker::{scan_directory, ScanOptions};

/// Name of the tool-owned directory created under a scanned root.
///
/// The walk never descends into it, so swept duplicates and reports are
/// invisible to later scans.
pub const OUTPUT_DIR_NAME: &str = "_photosieve";

/// File extensions treated as images, lowercase.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "bmp", "gif", "jpeg", "jpg", "png", "tif", "tiff", "webp",
];

/// A discovered image file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes at scan time
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Errors that can occur while scanning.
///
/// Per-entry walk failures are not listed here; they are logged and
/// absorbed so one unreadable directory cannot abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root does not exist.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The scan root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The scan root could not be resolved.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// What one directory scan discovered.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Canonicalized scan root.
    pub root: PathBuf,
    /// Image files, sorted by path.
    pub images: Vec<FileEntry>,
    /// Non-image files that were seen and passed over.
    pub skipped: Vec<PathBuf>,
    /// Combined size of all image files.
    pub total_bytes: u64,
}

impl ScanOutcome {
    /// Number of image files found.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

/// Tool-owned output directory under a scanned root.
#[must_use]
pub fn output_dir(root: &Path) -> PathBuf {
    root.join(OUTPUT_DIR_NAME)
}
