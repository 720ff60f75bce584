//! Application logic for the photosieve binary.
//!
//! [`run_app`] wires parsed CLI arguments to the library: scanning,
//! deduplication, sweeping, undo, and configuration. It returns the exit
//! code instead of exiting so the process boundary stays in `main`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bytesize::ByteSize;

use crate::actions::{
    default_history_path, resolve_destination_where, safe_move, undo_all, undo_last, UndoStack,
};
use crate::cli::{
    Cli, Commands, ConfigArgs, DetectionArgs, OutputFormat, ScanArgs, SweepArgs, UndoArgs,
};
use crate::config::AppConfig;
use crate::dedupe::{
    deduplicate, BatchOptions, DedupeResult, DuplicateGroup, GroupingConfig, ImageFingerprinter,
    SimilarityTier,
};
use crate::error::ExitCode;
use crate::logging::init_logging;
use crate::output::{JsonReport, TextReport};
use crate::progress::{ProgressCallback, TerminalProgress};
use crate::scanner::{output_dir, scan_directory, ScanOptions};
use crate::signal::{install_handler, ShutdownHandler};

/// Run the application and return the process exit code.
///
/// # Errors
///
/// Returns an error for unrecoverable failures: an unusable scan root, an
/// invalid threshold combination, or a history file that cannot be read
/// back. Per-item failures are absorbed into the exit code instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let Cli {
        verbose,
        quiet,
        no_color,
        json_errors: _,
        command,
    } = cli;

    init_logging(verbose, quiet);

    match command {
        Commands::Scan(args) => handle_scan(args, quiet, no_color),
        Commands::Sweep(args) => handle_sweep(args, quiet, no_color),
        Commands::Undo(args) => handle_undo(args, quiet),
        Commands::Config(args) => handle_config(&args),
    }
}

/// A finished detection run plus the context commands need afterwards.
struct DetectionRun {
    /// Canonicalized scan root.
    root: PathBuf,
    result: DedupeResult,
    grouping: GroupingConfig,
    shutdown: ShutdownHandler,
}

fn handle_scan(args: ScanArgs, quiet: bool, no_color: bool) -> Result<ExitCode> {
    let run = run_detection(&args.path, &args.detection, quiet, no_color)?;
    let exit_code = scan_exit_code(&run.result);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Json => JsonReport::new(&run.result, exit_code).write_to(&mut out, true)?,
        OutputFormat::Text => TextReport::new(&run.result, &run.grouping).write_to(&mut out)?,
    }

    Ok(exit_code)
}

fn handle_sweep(args: SweepArgs, quiet: bool, no_color: bool) -> Result<ExitCode> {
    let run = run_detection(&args.path, &args.detection, quiet, no_color)?;

    if !run.result.has_duplicates() {
        if !quiet {
            println!("No duplicates found, nothing to sweep.");
        }
        return Ok(scan_exit_code(&run.result));
    }

    let mut tiers: Vec<(SimilarityTier, &[DuplicateGroup])> = vec![(
        SimilarityTier::Identical,
        run.result.identical_groups.as_slice(),
    )];
    if args.similar {
        tiers.push((SimilarityTier::Similar, run.result.similar_groups.as_slice()));
    }

    let mut stack = UndoStack::load(default_history_path(&run.root));
    // Destinations promised by earlier dry-run lines; a wet run sees them
    // on disk instead.
    let mut planned: HashSet<PathBuf> = HashSet::new();
    let mut moved = 0usize;
    let mut failures = 0usize;
    let mut interrupted = run.result.interrupted;

    'tiers: for (tier, groups) in tiers {
        let dest_dir = duplicates_dir(&run.root, tier);
        for group in groups {
            for member in &group.members {
                if run.shutdown.is_interrupted() {
                    log::warn!("Sweep interrupted after {moved} moves");
                    interrupted = true;
                    break 'tiers;
                }

                let Some(name) = member.path.file_name() else {
                    log::warn!("Skipping {}: no file name", member.path.display());
                    failures += 1;
                    continue;
                };
                let destination =
                    resolve_destination_where(&dest_dir, &name.to_string_lossy(), |c| {
                        c.exists() || planned.contains(c)
                    });

                if args.dry_run {
                    println!(
                        "Would move {} -> {}",
                        member.path.display(),
                        destination.display()
                    );
                    planned.insert(destination);
                    moved += 1;
                    continue;
                }

                match safe_move(&member.path, &destination, &mut stack) {
                    Ok(_) => {
                        moved += 1;
                        if !quiet {
                            println!(
                                "Moved {} -> {}",
                                member.path.display(),
                                destination.display()
                            );
                        }
                    }
                    Err(e) => {
                        log::error!("Failed to move {}: {e}", member.path.display());
                        failures += 1;
                    }
                }
            }
        }
    }

    if !quiet {
        if args.dry_run {
            println!("Dry run: {moved} moves planned, nothing touched.");
        } else {
            println!(
                "Swept {} duplicates into {} ({} failures).",
                moved,
                output_dir(&run.root).join("duplicates").display(),
                failures
            );
        }
    }

    Ok(sweep_exit_code(
        moved,
        failures,
        run.result.hash_failures.len(),
        interrupted,
    ))
}

fn handle_undo(args: UndoArgs, quiet: bool) -> Result<ExitCode> {
    let history_path = args
        .history
        .unwrap_or_else(|| default_history_path(&args.path));
    let mut stack = UndoStack::load(history_path);

    if args.all {
        match undo_all(&mut stack) {
            Ok(records) if records.is_empty() => {
                if !quiet {
                    println!("Nothing to undo.");
                }
                Ok(ExitCode::Success)
            }
            Ok(records) => {
                for record in &records {
                    if !quiet {
                        println!(
                            "Restored {} <- {}",
                            record.source.display(),
                            record.destination.display()
                        );
                    }
                }
                if !quiet {
                    println!("Restored {} files.", records.len());
                }
                Ok(ExitCode::Success)
            }
            Err(e) => {
                // Moves undone before the failure stay undone; the record
                // that failed is still in the history.
                log::error!("Undo stopped: {e}");
                Ok(ExitCode::PartialSuccess)
            }
        }
    } else {
        match undo_last(&mut stack)? {
            Some(record) => {
                if !quiet {
                    println!(
                        "Restored {} <- {}",
                        record.source.display(),
                        record.destination.display()
                    );
                }
                Ok(ExitCode::Success)
            }
            None => {
                if !quiet {
                    println!("Nothing to undo.");
                }
                Ok(ExitCode::Success)
            }
        }
    }
}

fn handle_config(args: &ConfigArgs) -> Result<ExitCode> {
    let mut config = AppConfig::load();

    if args.is_show() {
        let path = AppConfig::config_path()?;
        println!("identical_max = {}", config.identical_max);
        println!("similar_max = {}", config.similar_max);
        println!("file: {}", path.display());
        return Ok(ExitCode::Success);
    }

    if let Some(identical) = args.identical_max {
        config.identical_max = identical;
    }
    if let Some(similar) = args.similar_max {
        config.similar_max = similar;
    }
    validate_thresholds(config.identical_max, config.similar_max)?;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(ExitCode::Success)
}

/// Scan, fingerprint, and group one directory.
fn run_detection(
    path: &Path,
    detection: &DetectionArgs,
    quiet: bool,
    no_color: bool,
) -> Result<DetectionRun> {
    let app_config = AppConfig::load();
    let grouping = app_config.resolve_thresholds(detection.identical_max, detection.similar_max);
    validate_thresholds(grouping.identical_max, grouping.similar_max)?;

    let scan_options = ScanOptions::default().with_skip_hidden(!detection.include_hidden);
    let scan = scan_directory(path, &scan_options)
        .with_context(|| format!("Failed to scan {}", path.display()))?;

    log::info!(
        "Found {} images ({}) under {}",
        scan.image_count(),
        ByteSize::b(scan.total_bytes),
        scan.root.display()
    );

    let shutdown = install_handler();
    let progress: Arc<dyn ProgressCallback> =
        Arc::new(TerminalProgress::new(quiet).with_color(!no_color));
    let options = BatchOptions::default()
        .with_progress(progress)
        .with_shutdown_flag(shutdown.flag())
        .with_parallel(!detection.sequential);

    let result = deduplicate(
        &scan.images,
        &ImageFingerprinter::default(),
        &grouping,
        &options,
    );

    Ok(DetectionRun {
        root: scan.root,
        result,
        grouping,
        shutdown,
    })
}

fn validate_thresholds(identical_max: u32, similar_max: u32) -> Result<()> {
    if !GroupingConfig::new(identical_max, similar_max).is_valid() {
        bail!(
            "Invalid thresholds: identical-max ({identical_max}) must be below \
             similar-max ({similar_max}), both at most 64"
        );
    }
    Ok(())
}

fn scan_exit_code(result: &DedupeResult) -> ExitCode {
    if result.interrupted {
        ExitCode::Interrupted
    } else if !result.hash_failures.is_empty() {
        ExitCode::PartialSuccess
    } else if result.has_duplicates() {
        ExitCode::Success
    } else {
        ExitCode::NoDuplicates
    }
}

fn sweep_exit_code(
    moved: usize,
    failures: usize,
    hash_failures: usize,
    interrupted: bool,
) -> ExitCode {
    if interrupted {
        ExitCode::Interrupted
    } else if failures > 0 || hash_failures > 0 {
        ExitCode::PartialSuccess
    } else if moved > 0 {
        ExitCode::Success
    } else {
        ExitCode::NoDuplicates
    }
}

/// Destination folder for swept members of one tier.
fn duplicates_dir(root: &Path, tier: SimilarityTier) -> PathBuf {
    output_dir(root).join("duplicates").join(tier.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_dir_layout() {
        let root = Path::new("/photos");
        assert_eq!(
            duplicates_dir(root, SimilarityTier::Identical),
            PathBuf::from("/photos/_photosieve/duplicates/identical")
        );
        assert_eq!(
            duplicates_dir(root, SimilarityTier::Similar),
            PathBuf::from("/photos/_photosieve/duplicates/similar")
        );
    }

    #[test]
    fn test_scan_exit_code_precedence() {
        let mut result = DedupeResult {
            scanned_count: 2,
            ..Default::default()
        };
        assert_eq!(scan_exit_code(&result), ExitCode::NoDuplicates);

        result.identical_groups.push(DuplicateGroup {
            representative: crate::dedupe::Fingerprint::new(0, 0, PathBuf::from("/a.png")),
            members: vec![crate::dedupe::Fingerprint::new(0, 0, PathBuf::from("/b.png"))],
            tier: SimilarityTier::Identical,
            mean_distance: 0.0,
        });
        assert_eq!(scan_exit_code(&result), ExitCode::Success);

        result.hash_failures.push(crate::dedupe::HashFailure {
            path: PathBuf::from("/broken.gif"),
            reason: "decode failed".to_string(),
        });
        assert_eq!(scan_exit_code(&result), ExitCode::PartialSuccess);

        result.interrupted = true;
        assert_eq!(scan_exit_code(&result), ExitCode::Interrupted);
    }

    #[test]
    fn test_sweep_exit_code() {
        assert_eq!(sweep_exit_code(3, 0, 0, false), ExitCode::Success);
        assert_eq!(sweep_exit_code(0, 0, 0, false), ExitCode::NoDuplicates);
        assert_eq!(sweep_exit_code(2, 1, 0, false), ExitCode::PartialSuccess);
        assert_eq!(sweep_exit_code(2, 0, 1, false), ExitCode::PartialSuccess);
        assert_eq!(sweep_exit_code(2, 1, 0, true), ExitCode::Interrupted);
    }

    #[test]
    fn test_validate_thresholds() {
        assert!(validate_thresholds(5, 12).is_ok());
        assert!(validate_thresholds(0, 1).is_ok());
        assert!(validate_thresholds(12, 5).is_err());
        assert!(validate_thresholds(5, 5).is_err());
        assert!(validate_thresholds(5, 65).is_err());
    }
}
