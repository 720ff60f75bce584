//! Command-line interface definitions for photosieve.
//!
//! This module defines all CLI arguments, subcommands, and options using the
//! clap derive API. Global options (verbosity, color, error format) sit on
//! the top-level parser; each operation gets its own subcommand.
//!
//! # Example
//!
//! ```bash
//! # Scan a photo library and print a text report
//! photosieve scan ~/Pictures
//!
//! # JSON report for scripting
//! photosieve scan ~/Pictures --output json
//!
//! # Move identical duplicates aside, then change your mind
//! photosieve sweep ~/Pictures
//! photosieve undo ~/Pictures --all
//!
//! # Verbose mode for debugging
//! photosieve -vv scan ~/Pictures
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::dedupe::MAX_DISTANCE;

/// Perceptual duplicate finder for photo collections.
///
/// photosieve fingerprints images with DCT and gradient hashes, groups
/// near-identical shots into identical and similar tiers, and can move
/// redundant copies aside. Files are never deleted, only moved, and every
/// move can be undone.
#[derive(Debug, Parser)]
#[command(name = "photosieve")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for photosieve.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory and report duplicate images
    Scan(ScanArgs),
    /// Scan a directory and move duplicate images aside
    Sweep(SweepArgs),
    /// Undo moves recorded by a previous sweep
    Undo(UndoArgs),
    /// Show or change the persisted default thresholds
    Config(ConfigArgs),
}

/// Detection options shared by the scan and sweep subcommands.
#[derive(Debug, Args)]
pub struct DetectionArgs {
    /// Identical-tier distance threshold (overrides the config file)
    #[arg(long, value_name = "N", value_parser = parse_threshold)]
    pub identical_max: Option<u32>,

    /// Similar-tier distance threshold (overrides the config file)
    #[arg(long, value_name = "N", value_parser = parse_threshold)]
    pub similar_max: Option<u32>,

    /// Include hidden files and directories (starting with .)
    #[arg(long)]
    pub include_hidden: bool,

    /// Fingerprint images one at a time instead of across all cores
    #[arg(long)]
    pub sequential: bool,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan for duplicate images
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format (text for reading, json for scripting)
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(flatten)]
    pub detection: DetectionArgs,
}

/// Arguments for the sweep subcommand.
#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Directory to scan and sweep
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Also move similar-tier duplicates, not just identical ones
    #[arg(long)]
    pub similar: bool,

    /// Print the planned moves without touching any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub detection: DetectionArgs,
}

/// Arguments for the undo subcommand.
#[derive(Debug, Args)]
pub struct UndoArgs {
    /// Directory whose sweep history to undo
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Undo every recorded move, newest first
    #[arg(long)]
    pub all: bool,

    /// History file to use instead of the conventional one under PATH
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,
}

/// Arguments for the config subcommand.
///
/// Without flags the current configuration and its file path are printed.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Persist a new identical-tier default threshold
    #[arg(long, value_name = "N", value_parser = parse_threshold)]
    pub identical_max: Option<u32>,

    /// Persist a new similar-tier default threshold
    #[arg(long, value_name = "N", value_parser = parse_threshold)]
    pub similar_max: Option<u32>,
}

impl ConfigArgs {
    /// True when no change was requested.
    #[must_use]
    pub fn is_show(&self) -> bool {
        self.identical_max.is_none() && self.similar_max.is_none()
    }
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text report
    Text,
    /// JSON output for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a Hamming-distance threshold from the command line.
///
/// Combined distances live on a 0..=64 scale, so anything above 64 can
/// never match and is rejected up front.
///
/// # Examples
///
/// ```
/// use photosieve::cli::parse_threshold;
///
/// assert_eq!(parse_threshold("12").unwrap(), 12);
/// assert_eq!(parse_threshold(" 0 ").unwrap(), 0);
/// assert!(parse_threshold("65").is_err());
/// ```
///
/// # Errors
///
/// Returns an error if the string is not a non-negative integer or exceeds
/// the maximum possible distance.
pub fn parse_threshold(s: &str) -> Result<u32, String> {
    let value: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid threshold: '{s}'"))?;

    if value > MAX_DISTANCE {
        return Err(format!(
            "Threshold must be at most {MAX_DISTANCE}, got {value}"
        ));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold_valid() {
        assert_eq!(parse_threshold("0").unwrap(), 0);
        assert_eq!(parse_threshold("5").unwrap(), 5);
        assert_eq!(parse_threshold("64").unwrap(), 64);
        assert_eq!(parse_threshold("  12  ").unwrap(), 12);
    }

    #[test]
    fn test_parse_threshold_errors() {
        assert!(parse_threshold("").is_err());
        assert!(parse_threshold("abc").is_err());
        assert!(parse_threshold("-1").is_err());
        assert!(parse_threshold("3.5").is_err());
        assert!(parse_threshold("65").is_err());
    }

    #[test]
    fn test_cli_parse_help() {
        // --help causes an early exit, which is an error in try_parse_from
        let result = Cli::try_parse_from(["photosieve", "--help"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_scan_basic() {
        let cli = Cli::try_parse_from(["photosieve", "scan", "/some/path"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(!cli.json_errors);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.path, PathBuf::from("/some/path"));
                assert_eq!(args.output, OutputFormat::Text);
                assert_eq!(args.detection.identical_max, None);
                assert!(!args.detection.include_hidden);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_with_options() {
        let cli = Cli::try_parse_from([
            "photosieve",
            "-v",
            "scan",
            "/path",
            "--output",
            "json",
            "--identical-max",
            "3",
            "--similar-max",
            "10",
            "--include-hidden",
            "--sequential",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);

        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.output, OutputFormat::Json);
                assert_eq!(args.detection.identical_max, Some(3));
                assert_eq!(args.detection.similar_max, Some(10));
                assert!(args.detection.include_hidden);
                assert!(args.detection.sequential);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_threshold_range_rejected() {
        let result = Cli::try_parse_from(["photosieve", "scan", "/path", "--identical-max", "99"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["photosieve", "-v", "-q", "scan", "/path"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_sweep() {
        let cli =
            Cli::try_parse_from(["photosieve", "sweep", "/path", "--similar", "-n"]).unwrap();
        match cli.command {
            Commands::Sweep(args) => {
                assert_eq!(args.path, PathBuf::from("/path"));
                assert!(args.similar);
                assert!(args.dry_run);
            }
            _ => panic!("Expected Sweep command"),
        }
    }

    #[test]
    fn test_cli_parse_sweep_defaults() {
        let cli = Cli::try_parse_from(["photosieve", "sweep", "/path"]).unwrap();
        match cli.command {
            Commands::Sweep(args) => {
                assert!(!args.similar);
                assert!(!args.dry_run);
            }
            _ => panic!("Expected Sweep command"),
        }
    }

    #[test]
    fn test_cli_parse_undo() {
        let cli = Cli::try_parse_from(["photosieve", "undo", "/path"]).unwrap();
        match cli.command {
            Commands::Undo(args) => {
                assert_eq!(args.path, PathBuf::from("/path"));
                assert!(!args.all);
                assert_eq!(args.history, None);
            }
            _ => panic!("Expected Undo command"),
        }

        let cli = Cli::try_parse_from([
            "photosieve",
            "undo",
            "/path",
            "--all",
            "--history",
            "/tmp/history.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Undo(args) => {
                assert!(args.all);
                assert_eq!(args.history, Some(PathBuf::from("/tmp/history.json")));
            }
            _ => panic!("Expected Undo command"),
        }
    }

    #[test]
    fn test_cli_parse_config() {
        let cli = Cli::try_parse_from(["photosieve", "config"]).unwrap();
        match cli.command {
            Commands::Config(args) => assert!(args.is_show()),
            _ => panic!("Expected Config command"),
        }

        let cli =
            Cli::try_parse_from(["photosieve", "config", "--similar-max", "14"]).unwrap();
        match cli.command {
            Commands::Config(args) => {
                assert!(!args.is_show());
                assert_eq!(args.similar_max, Some(14));
                assert_eq!(args.identical_max, None);
            }
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_cli_json_errors_is_global() {
        let cli =
            Cli::try_parse_from(["photosieve", "scan", "/path", "--json-errors"]).unwrap();
        assert!(cli.json_errors);
    }

    #[test]
    fn test_cli_no_color_flag() {
        let cli = Cli::try_parse_from(["photosieve", "--no-color", "scan", "/path"]).unwrap();
        assert!(cli.no_color);
    }

    #[test]
    fn test_cli_invalid_subcommand() {
        let result = Cli::try_parse_from(["photosieve", "invalid", "/path"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_missing_path() {
        let result = Cli::try_parse_from(["photosieve", "scan"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_version_flag() {
        // clap exits on --version
        let result = Cli::try_parse_from(["photosieve", "--version"]);
        assert!(result.is_err());
    }
}
