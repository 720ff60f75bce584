//! Report formatters for duplicate scan results.
//!
//! Two renderings of the same [`DedupeResult`](crate::dedupe::DedupeResult):
//! - JSON for automation and scripting
//! - plain text for reading in a terminal
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use photosieve::dedupe::{deduplicate, BatchOptions, GroupingConfig, ImageFingerprinter};
//! use photosieve::error::ExitCode;
//! use photosieve::output::JsonReport;
//! use photosieve::scanner::{scan_directory, ScanOptions};
//!
//! let scan = scan_directory(Path::new("photos"), &ScanOptions::default())?;
//! let config = GroupingConfig::default();
//! let result = deduplicate(
//!     &scan.images,
//!     &ImageFingerprinter::default(),
//!     &config,
//!     &BatchOptions::default(),
//! );
//!
//! let report = JsonReport::new(&result, ExitCode::Success);
//! println!("{}", report.to_json_pretty().unwrap());
//! # Ok::<(), photosieve::scanner::ScanError>(())
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{JsonFailure, JsonFile, JsonGroup, JsonReport, JsonSummary, ReportError};
pub use text::TextReport;
