//! File relocation actions with durable undo.
//!
//! This module is the only path by which files move:
//! - [`safe_move`] validates, renames, and records in that order
//! - [`UndoStack`] mirrors every recorded move to a JSON history file
//! - [`undo_last`] / [`undo_all`] reverse recorded moves, also after a
//!   process restart
//!
//! Files are never deleted, only moved; every move is reversible.

pub mod relocate;
pub mod undo;

// Re-export commonly used types
pub use relocate::{
    resolve_destination, resolve_destination_where, safe_move, undo_all, undo_last, MoveError,
};
pub use undo::{
    default_history_path, ActionKind, HistoryError, MoveRecord, UndoStack, HISTORY_FILE_NAME,
};
