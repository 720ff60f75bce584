//! End-to-end pipeline tests over real image files: scan, fingerprint,
//! group.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use photosieve::dedupe::{
    deduplicate, BatchOptions, GroupingConfig, ImageFingerprinter, SimilarityTier,
};
use photosieve::progress::ProgressCallback;
use photosieve::scanner::{scan_directory, ScanOptions};
use tempfile::tempdir;

fn checkerboard(size: u32, cell: u32) -> RgbImage {
    RgbImage::from_fn(size, size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

fn horizontal_gradient(size: u32) -> RgbImage {
    RgbImage::from_fn(size, size, |x, _| {
        let v = (x * 255 / size) as u8;
        Rgb([v, v, v])
    })
}

fn run(dir: &std::path::Path) -> photosieve::dedupe::DedupeResult {
    let scan = scan_directory(dir, &ScanOptions::default()).unwrap();
    deduplicate(
        &scan.images,
        &ImageFingerprinter::default(),
        &GroupingConfig::default(),
        &BatchOptions::default(),
    )
}

#[test]
fn test_exact_copies_form_identical_group() {
    let dir = tempdir().unwrap();
    checkerboard(64, 8).save(dir.path().join("a.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("b.png")).unwrap();
    horizontal_gradient(64)
        .save(dir.path().join("other.png"))
        .unwrap();

    let result = run(dir.path());

    assert_eq!(result.scanned_count, 3);
    assert_eq!(result.identical_groups.len(), 1);
    assert!(result.similar_groups.is_empty());

    let group = &result.identical_groups[0];
    assert_eq!(group.tier, SimilarityTier::Identical);
    assert_eq!(group.size(), 2);
    assert_eq!(group.mean_distance, 0.0);
    // Copies have equal size, so the lexically first path is kept.
    assert!(group.representative.path.ends_with("a.png"));

    assert_eq!(result.unmatched.len(), 1);
    assert!(result.unmatched[0].path.ends_with("other.png"));
}

#[test]
fn test_same_pixels_different_container_group_together() {
    // A lossless re-encode decodes to the same pixels, so both hash
    // families agree exactly.
    let dir = tempdir().unwrap();
    let img = checkerboard(64, 8);
    img.save(dir.path().join("shot.png")).unwrap();
    img.save(dir.path().join("shot.bmp")).unwrap();

    let result = run(dir.path());

    assert_eq!(result.identical_groups.len(), 1);
    assert_eq!(result.identical_groups[0].mean_distance, 0.0);
}

#[test]
fn test_distinct_images_stay_unmatched() {
    let dir = tempdir().unwrap();
    checkerboard(64, 8).save(dir.path().join("a.png")).unwrap();
    horizontal_gradient(64)
        .save(dir.path().join("b.png"))
        .unwrap();
    RgbImage::from_pixel(64, 64, Rgb([0, 0, 0]))
        .save(dir.path().join("c.png"))
        .unwrap();

    let result = run(dir.path());

    assert!(!result.has_duplicates());
    assert_eq!(result.unmatched.len(), 3);
    assert!(result.hash_failures.is_empty());
}

#[test]
fn test_undecodable_image_is_reported_not_fatal() {
    let dir = tempdir().unwrap();
    checkerboard(64, 8).save(dir.path().join("good.png")).unwrap();
    horizontal_gradient(64)
        .save(dir.path().join("also-good.png"))
        .unwrap();
    std::fs::write(dir.path().join("broken.png"), b"not an image").unwrap();

    let result = run(dir.path());

    assert_eq!(result.scanned_count, 3);
    assert_eq!(result.hash_failures.len(), 1);
    assert!(result.hash_failures[0].path.ends_with("broken.png"));
    assert!(!result.hash_failures[0].reason.is_empty());
    // The two decodable images still went through grouping.
    assert_eq!(result.unmatched.len(), 2);
}

#[test]
fn test_parallel_run_matches_sequential() {
    let dir = tempdir().unwrap();
    checkerboard(64, 8).save(dir.path().join("a.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("b.png")).unwrap();
    horizontal_gradient(64)
        .save(dir.path().join("c.png"))
        .unwrap();

    let scan = scan_directory(dir.path(), &ScanOptions::default()).unwrap();
    let fingerprinter = ImageFingerprinter::default();
    let config = GroupingConfig::default();

    let sequential = deduplicate(&scan.images, &fingerprinter, &config, &BatchOptions::new());
    let parallel = deduplicate(
        &scan.images,
        &fingerprinter,
        &config,
        &BatchOptions::new().with_parallel(true),
    );

    assert_eq!(
        sequential.identical_groups.len(),
        parallel.identical_groups.len()
    );
    assert_eq!(
        sequential.identical_groups[0].representative.path,
        parallel.identical_groups[0].representative.path
    );
    assert_eq!(
        sequential.unmatched.len(),
        parallel.unmatched.len()
    );
}

#[test]
fn test_preset_shutdown_flag_interrupts_run() {
    let dir = tempdir().unwrap();
    checkerboard(64, 8).save(dir.path().join("a.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("b.png")).unwrap();

    let flag = Arc::new(AtomicBool::new(false));
    flag.store(true, Ordering::SeqCst);

    let scan = scan_directory(dir.path(), &ScanOptions::default()).unwrap();
    let result = deduplicate(
        &scan.images,
        &ImageFingerprinter::default(),
        &GroupingConfig::default(),
        &BatchOptions::new().with_shutdown_flag(flag),
    );

    assert!(result.interrupted);
    assert_eq!(result.scanned_count, 2);
    assert!(!result.has_duplicates());
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("start:{phase}:{total}"));
    }

    fn on_progress(&self, _done: usize, _total: usize) {}

    fn on_phase_end(&self, phase: &str) {
        self.events.lock().unwrap().push(format!("end:{phase}"));
    }
}

#[test]
fn test_phases_bracket_the_pipeline() {
    let dir = tempdir().unwrap();
    checkerboard(64, 8).save(dir.path().join("a.png")).unwrap();
    horizontal_gradient(64)
        .save(dir.path().join("b.png"))
        .unwrap();

    let progress = Arc::new(RecordingProgress::default());
    let scan = scan_directory(dir.path(), &ScanOptions::default()).unwrap();
    let _ = deduplicate(
        &scan.images,
        &ImageFingerprinter::default(),
        &GroupingConfig::default(),
        &BatchOptions::new().with_progress(progress.clone()),
    );

    let events = progress.events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            "start:hashing:2".to_string(),
            "end:hashing".to_string(),
            "start:grouping:2".to_string(),
            "end:grouping".to_string(),
        ]
    );
}
