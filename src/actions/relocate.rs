//! Safe file relocation with durable undo.
//!
//! # Overview
//!
//! [`safe_move`] is the only way files are relocated. Each move runs as
//! `Requested -> validated -> Moved -> Recorded`, or stops at `Rejected`
//! with no filesystem mutation. The record lands on the [`UndoStack`] only
//! after the rename succeeded, and [`undo_last`] / [`undo_all`] reverse
//! recorded moves in LIFO order, surviving process restarts through the
//! persisted history.
//!
//! # Safety
//!
//! Preconditions are checked before anything is touched: a rejected move or
//! undo leaves the filesystem exactly as it was. A failed undo pushes the
//! popped record back onto the stack, so the history never drifts from the
//! filesystem and the undo can be retried.
//!
//! # Example
//!
//! ```no_run
//! use photosieve::actions::{safe_move, undo_last, UndoStack};
//! use std::path::Path;
//!
//! let mut stack = UndoStack::load("/photos/_photosieve/_reports/undo_history.json");
//! safe_move(
//!     Path::new("/photos/copy.png"),
//!     Path::new("/photos/_photosieve/duplicates/identical/copy.png"),
//!     &mut stack,
//! )?;
//! undo_last(&mut stack)?;
//! # Ok::<(), photosieve::actions::MoveError>(())
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::undo::{HistoryError, MoveRecord, UndoStack};

/// Error type for move and undo operations.
#[derive(Debug, Error)]
pub enum MoveError {
    /// The source file vanished before the move.
    #[error("source file not found: {0}")]
    SourceNotFound(PathBuf),

    /// The destination is already occupied.
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// The rename itself (or destination directory creation) failed.
    #[error("failed to move {from} to {to}: {source}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Undo found the moved file missing from its recorded destination.
    #[error("cannot undo, moved file missing: {0}")]
    UndoTargetMissing(PathBuf),

    /// Undo found the original location occupied again.
    #[error("cannot undo, original location occupied: {0}")]
    UndoSourceOccupied(PathBuf),

    /// The reverse rename (or source directory recreation) failed.
    #[error("failed to restore {to} back to {from}: {source}")]
    UndoFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The history snapshot could not be persisted.
    #[error(transparent)]
    History(#[from] HistoryError),
}

impl MoveError {
    /// Where the file the operation was acting on currently sits (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SourceNotFound(p)
            | Self::DestinationExists(p)
            | Self::UndoTargetMissing(p)
            | Self::UndoSourceOccupied(p) => Some(p),
            Self::MoveFailed { from, .. } => Some(from),
            Self::UndoFailed { to, .. } => Some(to),
            Self::History(_) => None,
        }
    }
}

/// Move `source` to `destination` and record the move for undo.
///
/// Both preconditions are checked before any mutation: the source must
/// exist and the destination must be free. Missing destination directories
/// are created, then the file is relocated with a single rename. The record
/// is appended (and the history persisted) only after the rename succeeded.
///
/// A cross-device destination fails the rename and surfaces as
/// [`MoveError::MoveFailed`]; there is no copy fallback, the
/// single-operation guarantee is part of the contract.
///
/// # Errors
///
/// - [`MoveError::SourceNotFound`] / [`MoveError::DestinationExists`] on a
///   precondition violation, with nothing mutated
/// - [`MoveError::MoveFailed`] when the OS rejects the move, with the stack
///   untouched
/// - [`MoveError::History`] when the move succeeded but the snapshot write
///   failed; the record stays on the in-memory stack
pub fn safe_move(
    source: &Path,
    destination: &Path,
    stack: &mut UndoStack,
) -> Result<MoveRecord, MoveError> {
    if !source.exists() {
        return Err(MoveError::SourceNotFound(source.to_path_buf()));
    }
    if destination.exists() {
        return Err(MoveError::DestinationExists(destination.to_path_buf()));
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| MoveError::MoveFailed {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: e,
        })?;
    }

    fs::rename(source, destination).map_err(|e| {
        log::error!(
            "Move failed for {} -> {}: {e}",
            source.display(),
            destination.display()
        );
        MoveError::MoveFailed {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: e,
        }
    })?;

    let record = MoveRecord::new(source.to_path_buf(), destination.to_path_buf());
    stack.push(record.clone())?;

    log::info!("Moved {} -> {}", source.display(), destination.display());
    Ok(record)
}

/// Undo the most recent recorded move.
///
/// Pops the tail record, verifies the moved file still sits at its recorded
/// destination and the original location is free, then renames it back. A
/// source directory that was removed after the sweep emptied it is
/// recreated first. On any failure the popped record is pushed back onto
/// the stack before the error is returned, so the operation can be retried.
/// An empty stack is `Ok(None)`.
///
/// # Errors
///
/// - [`MoveError::UndoTargetMissing`] / [`MoveError::UndoSourceOccupied`]
///   on a precondition violation, with nothing mutated
/// - [`MoveError::UndoFailed`] when the source directory cannot be
///   recreated or the OS rejects the reverse rename
/// - [`MoveError::History`] when the history snapshot could not be written
pub fn undo_last(stack: &mut UndoStack) -> Result<Option<MoveRecord>, MoveError> {
    let Some(record) = stack.pop()? else {
        log::debug!("Undo requested with empty history");
        return Ok(None);
    };

    if !record.destination.exists() {
        push_back(stack, record.clone());
        return Err(MoveError::UndoTargetMissing(record.destination));
    }
    if record.source.exists() {
        push_back(stack, record.clone());
        return Err(MoveError::UndoSourceOccupied(record.source));
    }

    // The source's folder may have been removed once the sweep emptied it.
    if let Some(parent) = record.source.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            push_back(stack, record.clone());
            return Err(MoveError::UndoFailed {
                from: record.source,
                to: record.destination,
                source: e,
            });
        }
    }

    if let Err(e) = fs::rename(&record.destination, &record.source) {
        log::error!(
            "Undo failed for {} -> {}: {e}",
            record.destination.display(),
            record.source.display()
        );
        push_back(stack, record.clone());
        return Err(MoveError::UndoFailed {
            from: record.source,
            to: record.destination,
            source: e,
        });
    }

    log::info!(
        "Restored {} <- {}",
        record.source.display(),
        record.destination.display()
    );
    Ok(Some(record))
}

/// Undo every recorded move, newest first.
///
/// Returns the undone records in undo order. A failing undo propagates
/// immediately: moves undone before it stay undone, the failing record
/// stays on the stack (per the push-back in [`undo_last`]), and older
/// records are left untouched.
///
/// # Errors
///
/// Propagates the first [`MoveError`] an individual undo raises.
pub fn undo_all(stack: &mut UndoStack) -> Result<Vec<MoveRecord>, MoveError> {
    let mut undone = Vec::new();
    while let Some(record) = undo_last(stack)? {
        undone.push(record);
    }

    log::info!("Undid {} move(s)", undone.len());
    Ok(undone)
}

/// Re-push a record after a failed undo, keeping stack and filesystem
/// consistent. A snapshot failure here still keeps the record in memory.
fn push_back(stack: &mut UndoStack, record: MoveRecord) {
    if let Err(err) = stack.push(record) {
        log::error!("Failed to persist history after undo failure: {err}");
    }
}

/// First free destination path for `file_name` inside `dir`.
///
/// Returns `dir/file_name` when free, otherwise `dir/stem (n).ext` for the
/// smallest n that is free. Collision resolution happens here so
/// [`safe_move`] keeps its strict destination-must-not-exist contract.
#[must_use]
pub fn resolve_destination(dir: &Path, file_name: &str) -> PathBuf {
    resolve_destination_where(dir, file_name, |candidate| candidate.exists())
}

/// Like [`resolve_destination`], with occupancy decided by `is_taken`
/// instead of the live filesystem.
///
/// A dry run passes a test that also covers the names it has already
/// planned, so repeated file names number the same way a real sweep would.
#[must_use]
pub fn resolve_destination_where(
    dir: &Path,
    file_name: &str,
    is_taken: impl Fn(&Path) -> bool,
) -> PathBuf {
    let direct = dir.join(file_name);
    if !is_taken(&direct) {
        return direct;
    }

    let (stem, extension) = split_name(file_name);
    let mut n: u32 = 1;
    loop {
        let candidate = match extension {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        };
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Split a file name into stem and extension; a leading-dot-only name has
/// no extension.
fn split_name(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    }
}
