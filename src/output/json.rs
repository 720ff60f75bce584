//! JSON report for duplicate scan results.
//!
//! Machine-readable output for scripting and automation. Paths are emitted
//! as-is, so non-ASCII file names survive a round trip through the report.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "groups": [
//!     {
//!       "tier": "identical",
//!       "mean_distance": 2.5,
//!       "representative": {"path": "/pics/a.png", "size": 20480},
//!       "members": [{"path": "/pics/a copy.png", "size": 20480}]
//!     }
//!   ],
//!   "failures": [
//!     {"path": "/pics/broken.gif", "reason": "..."}
//!   ],
//!   "summary": {
//!     "scanned_files": 100,
//!     "identical_groups": 1,
//!     "similar_groups": 0,
//!     "duplicate_files": 1,
//!     "unmatched_files": 97,
//!     "hash_failures": 1,
//!     "reclaimable_bytes": 20480,
//!     "interrupted": false,
//!     "exit_code": 0,
//!     "exit_code_name": "PS000"
//!   }
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use photosieve::dedupe::DedupeResult;
//! use photosieve::error::ExitCode;
//! use photosieve::output::JsonReport;
//!
//! let result = DedupeResult::default();
//! let report = JsonReport::new(&result, ExitCode::NoDuplicates);
//! println!("{}", report.to_json_pretty().unwrap());
//! ```

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::dedupe::grouping;
use crate::dedupe::{DedupeResult, DuplicateGroup, Fingerprint, SimilarityTier};
use crate::error::ExitCode;

/// A single file reference in the report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    /// Path as recorded during the scan.
    pub path: String,
    /// File size in bytes at report time; 0 when the file cannot be
    /// stat'ed anymore.
    pub size: u64,
}

impl JsonFile {
    fn from_fingerprint(fingerprint: &Fingerprint) -> Self {
        Self {
            path: path_string(&fingerprint.path),
            size: grouping::file_size(&fingerprint.path),
        }
    }
}

/// A duplicate group in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// Threshold band the group was formed in.
    pub tier: SimilarityTier,
    /// Mean pairwise distance inside the group.
    pub mean_distance: f64,
    /// The member chosen to keep.
    pub representative: JsonFile,
    /// The redundant copies.
    pub members: Vec<JsonFile>,
}

impl JsonGroup {
    /// Create a JSON group from a [`DuplicateGroup`].
    #[must_use]
    pub fn from_group(group: &DuplicateGroup) -> Self {
        Self {
            tier: group.tier,
            mean_distance: group.mean_distance,
            representative: JsonFile::from_fingerprint(&group.representative),
            members: group.members.iter().map(JsonFile::from_fingerprint).collect(),
        }
    }
}

/// A file that could not be fingerprinted.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    /// Path of the unreadable image.
    pub path: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Summary statistics in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Number of image files handed to the run.
    pub scanned_files: usize,
    /// Number of identical-tier groups.
    pub identical_groups: usize,
    /// Number of similar-tier groups.
    pub similar_groups: usize,
    /// Total redundant copies across both tiers.
    pub duplicate_files: usize,
    /// Files that matched nothing.
    pub unmatched_files: usize,
    /// Files that could not be read or decoded.
    pub hash_failures: usize,
    /// Bytes freed by removing every identical-tier copy.
    pub reclaimable_bytes: u64,
    /// Whether the run was interrupted.
    pub interrupted: bool,
    /// The exit code number.
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "PS000").
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a [`DedupeResult`] and an exit code.
    #[must_use]
    pub fn from_result(result: &DedupeResult, exit_code: ExitCode) -> Self {
        Self {
            scanned_files: result.scanned_count,
            identical_groups: result.identical_groups.len(),
            similar_groups: result.similar_groups.len(),
            duplicate_files: result.duplicate_count(),
            unmatched_files: result.unmatched.len(),
            hash_failures: result.hash_failures.len(),
            reclaimable_bytes: result.reclaimable_bytes(),
            interrupted: result.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON report structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    /// Every duplicate group, identical tier first.
    pub groups: Vec<JsonGroup>,
    /// Files skipped because they could not be fingerprinted.
    pub failures: Vec<JsonFailure>,
    /// Run statistics.
    pub summary: JsonSummary,
}

impl JsonReport {
    /// Build a report from a finished run and the exit code chosen for it.
    #[must_use]
    pub fn new(result: &DedupeResult, exit_code: ExitCode) -> Self {
        Self {
            groups: result.groups().map(JsonGroup::from_group).collect(),
            failures: result
                .hash_failures
                .iter()
                .map(|f| JsonFailure {
                    path: path_string(&f.path),
                    reason: f.reason.clone(),
                })
                .collect(),
            summary: JsonSummary::from_result(result, exit_code),
        }
    }

    /// Serialize to a compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to a pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report to a writer, followed by a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), ReportError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Errors that can occur while emitting a report.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error while writing report: {0}")]
    Io(#[from] std::io::Error),
}
