//! Persistent move history backing the undo operations.
//!
//! # Overview
//!
//! Every completed relocation is recorded as a [`MoveRecord`] on an
//! [`UndoStack`] bound to one history file. The stack is LIFO and mirrors
//! itself to disk after every mutation as a full JSON snapshot, so undo
//! survives a process restart.
//!
//! # Persistence
//!
//! The history file holds a JSON array of records, each with `source`,
//! `destination`, an ISO-8601 `timestamp`, and `kind`. A missing or corrupt
//! file loads as an empty stack; the corrupt case is logged but never an
//! error. A record is never dropped on a failed write: the in-memory stack
//! keeps (or takes back) the record, so it can still be undone in-process
//! and the snapshot retried.
//!
//! The stack is not safe for concurrent writers of the same history file;
//! callers must serialize access.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scanner::OUTPUT_DIR_NAME;

/// File name of the history snapshot inside the reports folder.
pub const HISTORY_FILE_NAME: &str = "undo_history.json";

/// Reports folder name inside the tool-owned output directory.
const REPORTS_DIR_NAME: &str = "_reports";

/// Error type for history persistence.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The directory holding the history file could not be created.
    #[error("failed to create history directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The snapshot could not be written.
    #[error("failed to write history file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The records could not be encoded as JSON.
    #[error("failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The kind of action a record reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// A file relocation.
    Move,
}

/// Receipt for one completed relocation.
///
/// Constructed only after the filesystem move succeeded: at creation time
/// `source` no longer exists and `destination` does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Where the file was.
    pub source: PathBuf,
    /// Where the file is now.
    pub destination: PathBuf,
    /// When the move completed.
    pub timestamp: DateTime<Utc>,
    /// What kind of action this reverses.
    pub kind: ActionKind,
}

impl MoveRecord {
    /// Create a receipt for a move that just completed, stamped now.
    #[must_use]
    pub fn new(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            source,
            destination,
            timestamp: Utc::now(),
            kind: ActionKind::Move,
        }
    }
}

/// Default history location under a scanned root:
/// `<root>/_photosieve/_reports/undo_history.json`.
#[must_use]
pub fn default_history_path(root: &Path) -> PathBuf {
    root.join(OUTPUT_DIR_NAME)
        .join(REPORTS_DIR_NAME)
        .join(HISTORY_FILE_NAME)
}

/// LIFO stack of completed moves, mirrored to one history file.
#[derive(Debug)]
pub struct UndoStack {
    history_path: PathBuf,
    records: Vec<MoveRecord>,
}

impl UndoStack {
    /// Load the stack bound to `history_path`.
    ///
    /// Never fails: a missing file is a fresh empty history, a corrupt one
    /// resets to empty with a warning. Availability is preferred over a
    /// partial read.
    #[must_use]
    pub fn load(history_path: impl Into<PathBuf>) -> Self {
        let history_path = history_path.into();
        let records = match fs::read_to_string(&history_path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(records) => records,
                Err(err) => {
                    log::warn!(
                        "Corrupt history file {}, starting empty: {err}",
                        history_path.display()
                    );
                    Vec::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("No history file at {}", history_path.display());
                Vec::new()
            }
            Err(err) => {
                log::warn!(
                    "Could not read history file {}, starting empty: {err}",
                    history_path.display()
                );
                Vec::new()
            }
        };

        log::debug!(
            "Loaded {} history record(s) from {}",
            records.len(),
            history_path.display()
        );
        Self {
            history_path,
            records,
        }
    }

    /// Append a record and persist the snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`HistoryError`] if the snapshot cannot be written. The
    /// record stays on the in-memory stack either way, so the move it
    /// describes can still be undone in this process.
    pub fn push(&mut self, record: MoveRecord) -> Result<(), HistoryError> {
        self.records.push(record);
        self.save()
    }

    /// Remove and return the most recent record, persisting the snapshot.
    ///
    /// An empty stack returns `Ok(None)` without touching the file.
    ///
    /// # Errors
    ///
    /// Returns a [`HistoryError`] if the snapshot cannot be written; the
    /// record is put back first, so it is never lost to a failed write.
    pub fn pop(&mut self) -> Result<Option<MoveRecord>, HistoryError> {
        let Some(record) = self.records.pop() else {
            return Ok(None);
        };
        if let Err(err) = self.save() {
            self.records.push(record);
            return Err(err);
        }
        Ok(Some(record))
    }

    /// Drop every record and persist the empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`HistoryError`] if the snapshot cannot be written; the
    /// records are restored first.
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        let drained = std::mem::take(&mut self.records);
        if let Err(err) = self.save() {
            self.records = drained;
            return Err(err);
        }
        log::info!("Cleared {} history record(s)", drained.len());
        Ok(())
    }

    /// The most recent record, without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&MoveRecord> {
        self.records.last()
    }

    /// Number of records on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no moves are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &MoveRecord> {
        self.records.iter()
    }

    /// The history file this stack mirrors to.
    #[must_use]
    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    /// Overwrite the history file with the full current record list.
    fn save(&self) -> Result<(), HistoryError> {
        if let Some(parent) = self.history_path.parent() {
            fs::create_dir_all(parent).map_err(|e| HistoryError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let text = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.history_path, text).map_err(|e| HistoryError::Write {
            path: self.history_path.clone(),
            source: e,
        })
    }
}
