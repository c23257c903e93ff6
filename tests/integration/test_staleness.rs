//! Integration tests for snapshot staleness detection

use crate::fixtures::{create_listing_fixture, create_trash_fixture, write_file_sync};
use navcore::DirectorySnapshot;
use std::fs;
use std::thread::sleep;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn fresh_listing_is_not_stale() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_listing_fixture(temp_dir.path()).unwrap();

    let mut snapshot = DirectorySnapshot::new();
    snapshot.list(&[dir], false);
    assert!(!snapshot.is_stale());
}

#[test]
fn never_listed_snapshot_is_stale() {
    let snapshot = DirectorySnapshot::new();
    assert!(snapshot.is_stale());
}

#[test]
fn directory_mutation_makes_it_stale() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_listing_fixture(temp_dir.path()).unwrap();

    let mut snapshot = DirectorySnapshot::new();
    snapshot.list(&[dir.clone()], false);

    sleep(Duration::from_millis(50));
    write_file_sync(dir.join("late.txt"), b"late").unwrap();
    assert!(snapshot.is_stale());
}

#[test]
fn vanished_source_forces_reload() {
    let temp_dir = TempDir::new().unwrap();
    let dir = create_listing_fixture(temp_dir.path()).unwrap();

    let mut snapshot = DirectorySnapshot::new();
    snapshot.list(&[dir.clone()], false);

    fs::remove_dir_all(&dir).unwrap();
    assert!(snapshot.is_stale());
}

#[test]
fn any_stale_source_in_a_merged_view_triggers_reload() {
    let temp_dir = TempDir::new().unwrap();
    let one = temp_dir.path().join("one");
    let two = temp_dir.path().join("two");
    fs::create_dir_all(&one).unwrap();
    fs::create_dir_all(&two).unwrap();

    let mut snapshot = DirectorySnapshot::new();
    snapshot.list(&[one, two.clone()], false);
    assert!(!snapshot.is_stale());

    sleep(Duration::from_millis(50));
    write_file_sync(two.join("new.txt"), b"n").unwrap();
    assert!(snapshot.is_stale());
}

#[test]
fn trash_staleness_probes_the_files_subtree() {
    let temp_dir = TempDir::new().unwrap();
    let trash = create_trash_fixture(temp_dir.path()).unwrap();

    let mut snapshot = DirectorySnapshot::new();
    snapshot.list(&[trash.clone()], true);
    assert!(!snapshot.is_stale());

    sleep(Duration::from_millis(50));
    write_file_sync(trash.join("files/fresh.txt"), b"f").unwrap();
    assert!(snapshot.is_stale());
}
