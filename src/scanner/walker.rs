//! Directory walker collecting image files.
//!
//! Walks a root with `walkdir`, never following symlinks, and classifies
//! regular files by lowercased extension. Hidden subtrees are pruned when
//! configured; the tool-owned output directory is always pruned so swept
//! duplicates never re-enter a scan. Results come back sorted by path, so
//! repeated scans of an unchanged tree are byte-for-byte deterministic.

use std::fs;
use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use super::{FileEntry, ScanError, ScanOutcome, IMAGE_EXTENSIONS, OUTPUT_DIR_NAME};

/// Options controlling a directory scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Skip hidden files and never descend into hidden directories.
    pub skip_hidden: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { skip_hidden: true }
    }
}

impl ScanOptions {
    /// Create the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable hidden-entry skipping.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip_hidden: bool) -> Self {
        self.skip_hidden = skip_hidden;
        self
    }
}

/// Scan `root` recursively for image files.
///
/// The root is canonicalized first, so every returned path is absolute and
/// resolved. Regular files with an image extension become [`FileEntry`]
/// values with their stat'd size; other regular files land in `skipped`.
/// Per-entry walk errors (unreadable directories, files vanishing
/// mid-walk) are logged and absorbed.
///
/// # Errors
///
/// Returns [`ScanError::NotFound`] for a missing root,
/// [`ScanError::NotADirectory`] for a non-directory root, and
/// [`ScanError::Io`] if the root cannot be canonicalized.
pub fn scan_directory(root: &Path, options: &ScanOptions) -> Result<ScanOutcome, ScanError> {
    if !root.exists() {
        return Err(ScanError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let root = fs::canonicalize(root).map_err(|e| ScanError::Io {
        path: root.to_path_buf(),
        source: e,
    })?;

    log::info!("Scanning {}", root.display());

    let mut images = Vec::new();
    let mut skipped = Vec::new();

    let skip_hidden = options.skip_hidden;
    let walk = WalkDir::new(&root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        // Depth 0 is the root itself; an explicitly hidden root still scans.
        .filter_entry(move |entry| entry.depth() == 0 || !is_excluded(entry, skip_hidden));

    for entry in walk {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path().to_path_buf();
        if !is_image_name(&path) {
            log::trace!("Skipping non-image file: {}", path.display());
            skipped.push(path);
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => images.push(FileEntry::new(path, metadata.len())),
            Err(err) => {
                log::warn!("Could not stat {}: {err}", path.display());
                skipped.push(path);
            }
        }
    }

    images.sort_by(|a, b| a.path.cmp(&b.path));
    let total_bytes = images.iter().map(|f| f.size).sum();

    log::info!(
        "Found {} image file(s), skipped {} other file(s)",
        images.len(),
        skipped.len()
    );

    Ok(ScanOutcome {
        root,
        images,
        skipped,
        total_bytes,
    })
}

/// True for entries the walk must not yield or descend into.
fn is_excluded(entry: &DirEntry, skip_hidden: bool) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name == OUTPUT_DIR_NAME {
        return true;
    }
    skip_hidden && name.starts_with('.')
}

/// Classify a path by its lowercased extension.
fn is_image_name(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}
