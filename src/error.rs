//! Process exit codes and structured error output.

use serde::Serialize;

/// Exit codes reported by the photosieve binary.
///
/// - 0: completed normally, duplicates found (and handled)
/// - 1: unexpected failure
/// - 2: completed normally, collection is clean
/// - 3: completed with non-fatal per-item failures
/// - 130: interrupted by Ctrl-C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Run completed and duplicates were found.
    Success = 0,
    /// An unexpected error aborted the run.
    GeneralError = 1,
    /// Run completed and no duplicates were found.
    NoDuplicates = 2,
    /// Run completed, but some files failed to hash or move.
    PartialSuccess = 3,
    /// Interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric process exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code for structured output.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "PS000",
            Self::GeneralError => "PS001",
            Self::NoDuplicates => "PS002",
            Self::PartialSuccess => "PS003",
            Self::Interrupted => "PS130",
        }
    }
}

/// Error shape emitted on stderr when `--json-errors` is set.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Machine-readable code (e.g. "PS001")
    pub code: String,
    /// Numeric exit code
    pub exit_code: i32,
    /// Human-readable message
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Build the structured form of a fatal error.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
