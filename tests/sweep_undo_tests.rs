//! Integration tests for the sweep-and-undo flow: detect duplicates, move
//! the redundant copies into the tool-owned folder, then roll the moves
//! back.

use std::path::Path;

use image::{Rgb, RgbImage};
use photosieve::actions::{
    default_history_path, resolve_destination, safe_move, undo_all, undo_last, UndoStack,
};
use photosieve::dedupe::{
    deduplicate, BatchOptions, DedupeResult, GroupingConfig, ImageFingerprinter,
};
use photosieve::scanner::{output_dir, scan_directory, ScanOptions};
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

fn detect(root: &Path) -> (std::path::PathBuf, DedupeResult) {
    let scan = scan_directory(root, &ScanOptions::default()).unwrap();
    let result = deduplicate(
        &scan.images,
        &ImageFingerprinter::default(),
        &GroupingConfig::default(),
        &BatchOptions::default(),
    );
    (scan.root, result)
}

/// Move every identical-tier member into the duplicates folder, the way the
/// sweep command does.
fn sweep_identical(root: &Path, result: &DedupeResult, stack: &mut UndoStack) -> usize {
    let dest_dir = output_dir(root).join("duplicates").join("identical");
    let mut moved = 0;
    for group in &result.identical_groups {
        for member in &group.members {
            let name = member.path.file_name().unwrap().to_string_lossy().into_owned();
            let destination = resolve_destination(&dest_dir, &name);
            safe_move(&member.path, &destination, stack).unwrap();
            moved += 1;
        }
    }
    moved
}

#[test]
fn test_sweep_moves_members_and_rescan_is_clean() {
    let dir = tempdir().unwrap();
    checkerboard(64, 8).save(dir.path().join("a.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("b.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("c.png")).unwrap();

    let (root, result) = detect(dir.path());
    assert_eq!(result.identical_groups.len(), 1);
    assert_eq!(result.identical_groups[0].members.len(), 2);

    let mut stack = UndoStack::load(default_history_path(&root));
    let moved = sweep_identical(&root, &result, &mut stack);
    assert_eq!(moved, 2);
    assert_eq!(stack.len(), 2);

    // The representative stays; the members moved into the layout.
    let dest_dir = output_dir(&root).join("duplicates").join("identical");
    assert!(dir.path().join("a.png").exists());
    assert!(!dir.path().join("b.png").exists());
    assert!(!dir.path().join("c.png").exists());
    assert!(dest_dir.join("b.png").exists());
    assert!(dest_dir.join("c.png").exists());

    // The tool-owned folder is pruned, so a rescan sees a clean library.
    let (_, rescan) = detect(dir.path());
    assert_eq!(rescan.scanned_count, 1);
    assert!(!rescan.has_duplicates());
}

#[test]
fn test_undo_all_restores_the_library() {
    let dir = tempdir().unwrap();
    checkerboard(64, 8).save(dir.path().join("a.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("b.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("c.png")).unwrap();

    let (root, result) = detect(dir.path());
    let mut stack = UndoStack::load(default_history_path(&root));
    sweep_identical(&root, &result, &mut stack);

    let undone = undo_all(&mut stack).unwrap();
    assert_eq!(undone.len(), 2);
    assert!(stack.is_empty());

    let dest_dir = output_dir(&root).join("duplicates").join("identical");
    assert!(dir.path().join("b.png").exists());
    assert!(dir.path().join("c.png").exists());
    assert!(!dest_dir.join("b.png").exists());
    assert!(!dest_dir.join("c.png").exists());

    // Everything is back, so detection finds the same duplicates again.
    let (_, redetect) = detect(dir.path());
    assert_eq!(redetect.identical_groups.len(), 1);
    assert_eq!(redetect.identical_groups[0].members.len(), 2);
}

#[test]
fn test_undo_last_is_newest_first() {
    let dir = tempdir().unwrap();
    checkerboard(64, 8).save(dir.path().join("a.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("b.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("c.png")).unwrap();

    let (root, result) = detect(dir.path());
    let mut stack = UndoStack::load(default_history_path(&root));
    sweep_identical(&root, &result, &mut stack);

    // Members sweep in path order, so c.png was moved last.
    let record = undo_last(&mut stack).unwrap().unwrap();
    assert!(record.source.ends_with("c.png"));
    assert!(dir.path().join("c.png").exists());
    assert!(!dir.path().join("b.png").exists());
    assert_eq!(stack.len(), 1);
}

#[test]
fn test_undo_restores_into_removed_source_directory() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("vacation")).unwrap();
    checkerboard(64, 8).save(dir.path().join("keep.png")).unwrap();
    std::fs::copy(
        dir.path().join("keep.png"),
        dir.path().join("vacation").join("img.png"),
    )
    .unwrap();

    let (root, result) = detect(dir.path());
    let mut stack = UndoStack::load(default_history_path(&root));
    assert_eq!(sweep_identical(&root, &result, &mut stack), 1);

    // The sweep emptied vacation/ and the user removed the empty folder.
    std::fs::remove_dir(dir.path().join("vacation")).unwrap();

    let record = undo_last(&mut stack).unwrap().unwrap();
    assert!(record.source.ends_with("vacation/img.png"));
    assert!(dir.path().join("vacation").join("img.png").exists());
    assert!(stack.is_empty());
}

#[test]
fn test_colliding_member_names_get_numbered() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub1")).unwrap();
    std::fs::create_dir(dir.path().join("sub2")).unwrap();
    checkerboard(64, 8)
        .save(dir.path().join("img.png"))
        .unwrap();
    std::fs::copy(
        dir.path().join("img.png"),
        dir.path().join("sub1").join("img.png"),
    )
    .unwrap();
    std::fs::copy(
        dir.path().join("img.png"),
        dir.path().join("sub2").join("img.png"),
    )
    .unwrap();

    let (root, result) = detect(dir.path());
    assert_eq!(result.identical_groups.len(), 1);

    let mut stack = UndoStack::load(default_history_path(&root));
    sweep_identical(&root, &result, &mut stack);

    let dest_dir = output_dir(&root).join("duplicates").join("identical");
    assert!(dest_dir.join("img.png").exists());
    assert!(dest_dir.join("img (1).png").exists());

    // Undo sends each copy back to its own directory.
    undo_all(&mut stack).unwrap();
    assert!(dir.path().join("sub1").join("img.png").exists());
    assert!(dir.path().join("sub2").join("img.png").exists());
    assert!(!dest_dir.join("img.png").exists());
}

#[test]
fn test_history_survives_reload() {
    let dir = tempdir().unwrap();
    checkerboard(64, 8).save(dir.path().join("a.png")).unwrap();
    std::fs::copy(dir.path().join("a.png"), dir.path().join("b.png")).unwrap();

    let (root, result) = detect(dir.path());
    {
        let mut stack = UndoStack::load(default_history_path(&root));
        sweep_identical(&root, &result, &mut stack);
        assert_eq!(stack.len(), 1);
    }

    // A fresh load sees the persisted record and can still undo it.
    let mut stack = UndoStack::load(default_history_path(&root));
    assert_eq!(stack.len(), 1);
    let record = undo_last(&mut stack).unwrap().unwrap();
    assert!(record.source.ends_with("b.png"));
    assert!(dir.path().join("b.png").exists());
}
