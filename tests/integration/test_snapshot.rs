//! Integration tests for snapshot listing and incremental mutation

use crate::fixtures::{create_listing_fixture, write_file_sync};
use navcore::models::{FsEvent, FsEventKind};
use navcore::DirectorySnapshot;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn list_populates_entries_and_aggregates() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_listing_fixture(temp_dir.path()).unwrap();

    let mut snapshot = DirectorySnapshot::new();
    let notices = snapshot.list(&[dir.clone()], false);

    assert!(notices.is_empty());
    assert_eq!(snapshot.len(), 3);
    let stats = snapshot.stats();
    assert_eq!(stats.file_count, 2);
    assert_eq!(stats.dir_count, 1);
    assert_eq!(stats.total_bytes, 300);

    let sub = snapshot
        .entries()
        .iter()
        .find(|e| e.name == "sub")
        .expect("Should find sub");
    assert!(sub.is_directory);
    assert_eq!(sub.size_bytes, 0);
    assert_eq!(sub.extension, None);
}

#[test]
fn missing_source_yields_notice_not_failure() {
    let mut snapshot = DirectorySnapshot::new();
    let notices = snapshot.list(&[PathBuf::from("/nonexistent/nowhere")], false);

    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("does not exist"));
    assert!(snapshot.is_empty());
}

#[test]
fn merged_listing_spans_sources() {
    let temp_dir = TempDir::new().unwrap();
    let one = temp_dir.path().join("one");
    let two = temp_dir.path().join("two");
    write_file_sync(one.join("x.txt"), b"xx").unwrap();
    write_file_sync(two.join("y.txt"), b"yyy").unwrap();

    let mut snapshot = DirectorySnapshot::new();
    snapshot.list(&[one.clone(), two.clone()], false);

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.stats().total_bytes, 5);
    let x = snapshot.entries().iter().find(|e| e.name == "x.txt").unwrap();
    assert_eq!(x.source_path, one);
}

#[test]
fn insert_update_remove_keep_aggregates_consistent() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_listing_fixture(temp_dir.path()).unwrap();

    let mut snapshot = DirectorySnapshot::new();
    snapshot.list(&[dir.clone()], false);

    // Created
    write_file_sync(dir.join("c.txt"), [b'c'; 50]).unwrap();
    assert!(snapshot.insert(&dir.join("c.txt")));
    assert_eq!(snapshot.stats().file_count, 3);
    assert_eq!(snapshot.stats().total_bytes, 350);

    // Duplicate create notification is a no-op
    assert!(!snapshot.insert(&dir.join("c.txt")));
    assert_eq!(snapshot.stats().file_count, 3);

    // Modified: grew from 100 to 140 bytes
    write_file_sync(dir.join("a.txt"), [b'a'; 140]).unwrap();
    snapshot.update(&dir.join("a.txt"));
    assert_eq!(snapshot.stats().total_bytes, 390);

    // Deleted
    fs::remove_file(dir.join("a.txt")).unwrap();
    assert!(snapshot.remove(&dir.join("a.txt").to_string_lossy()));
    assert_eq!(snapshot.stats().file_count, 2);
    assert_eq!(snapshot.stats().total_bytes, 250);

    // Second delete notification for the same entry is idempotent
    assert!(!snapshot.remove(&dir.join("a.txt").to_string_lossy()));
}

#[test]
fn rename_keeps_aggregates_and_refreshes_extension() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_listing_fixture(temp_dir.path()).unwrap();

    let mut snapshot = DirectorySnapshot::new();
    snapshot.list(&[dir.clone()], false);
    let before = snapshot.stats();

    fs::rename(dir.join("a.txt"), dir.join("a.md")).unwrap();
    snapshot.rename(
        &dir.join("a.txt").to_string_lossy(),
        &dir.join("a.md").to_string_lossy(),
    );

    assert_eq!(snapshot.stats(), before);
    let renamed = snapshot.entries().iter().find(|e| e.name == "a.md").unwrap();
    assert_eq!(renamed.extension.as_deref(), Some("md"));
    assert!(!snapshot.entries().iter().any(|e| e.name == "a.txt"));
}

#[test]
fn mutations_racing_a_delete_are_benign() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_listing_fixture(temp_dir.path()).unwrap();

    let mut snapshot = DirectorySnapshot::new();
    snapshot.list(&[dir.clone()], false);
    let before = snapshot.stats();

    // Update and rename for entries that never existed must not disturb
    // anything.
    snapshot.update(&dir.join("ghost.txt"));
    snapshot.rename(
        &dir.join("ghost.txt").to_string_lossy(),
        &dir.join("ghost.md").to_string_lossy(),
    );
    // Insert for a path that vanished before stat
    assert!(!snapshot.insert(&dir.join("vanished.txt")));

    assert_eq!(snapshot.stats(), before);
    assert_eq!(snapshot.len(), 3);
}

#[test]
fn apply_routes_feed_events_to_mutations() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_listing_fixture(temp_dir.path()).unwrap();

    let mut snapshot = DirectorySnapshot::new();
    snapshot.list(&[dir.clone()], false);

    write_file_sync(dir.join("d.txt"), b"dd").unwrap();
    assert!(snapshot.apply(&FsEvent {
        kind: FsEventKind::Created,
        src_path: dir.join("d.txt"),
        dest_path: None,
    }));
    assert_eq!(snapshot.stats().file_count, 3);

    assert!(snapshot.apply(&FsEvent {
        kind: FsEventKind::Deleted,
        src_path: dir.join("d.txt"),
        dest_path: None,
    }));
    assert_eq!(snapshot.stats().file_count, 2);

    // A move without a destination cannot be applied
    assert!(!snapshot.apply(&FsEvent {
        kind: FsEventKind::Moved,
        src_path: dir.join("a.txt"),
        dest_path: None,
    }));
}

#[test]
fn selection_survives_relisting() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_listing_fixture(temp_dir.path()).unwrap();

    let mut snapshot = DirectorySnapshot::new();
    snapshot.list(&[dir.clone()], false);

    let row = snapshot
        .entries()
        .iter()
        .position(|e| e.name == "b.txt")
        .unwrap();
    snapshot.toggle(row);
    assert_eq!(snapshot.selection().stats().selected_count, 1);
    assert_eq!(snapshot.selection().stats().selected_bytes, 200);

    snapshot.list(&[dir], false);
    let stats = snapshot.selection().stats();
    assert_eq!(stats.selected_count, 1);
    assert_eq!(stats.selected_bytes, 200);
    assert_eq!(snapshot.recompute_selection(), stats);
}

#[test]
fn generation_bumps_on_every_mutation() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_listing_fixture(temp_dir.path()).unwrap();

    let mut snapshot = DirectorySnapshot::new();
    let g0 = snapshot.generation();
    snapshot.list(&[dir.clone()], false);
    let g1 = snapshot.generation();
    assert!(g1 > g0);

    write_file_sync(dir.join("c.txt"), b"c").unwrap();
    snapshot.insert(&dir.join("c.txt"));
    assert!(snapshot.generation() > g1);
}
