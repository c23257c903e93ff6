//! Integration tests for move semantics

use crate::fixtures::write_file_sync;
use navcore::{CopyAct, CopyJob, JobState, Resolution};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

#[test]
fn moves_a_file_into_a_directory() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_file_sync(src.join("f.txt"), b"payload").unwrap();
    fs::create_dir_all(&dst).unwrap();

    let mut job = CopyJob::new(CopyAct::Move, vec![src.join("f.txt")], dst.clone());
    job.run().unwrap();

    assert_eq!(job.state(), JobState::Done);
    assert_eq!(fs::read(dst.join("f.txt")).unwrap(), b"payload");
    assert!(!src.join("f.txt").exists());
}

#[test]
fn moves_a_tree_into_a_directory() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src/tree");
    let dst = temp_dir.path().join("dst");
    write_file_sync(src.join("a.txt"), b"a").unwrap();
    write_file_sync(src.join("nested/b.txt"), b"bb").unwrap();
    fs::create_dir_all(&dst).unwrap();

    let mut job = CopyJob::new(CopyAct::Move, vec![src.clone()], dst.clone());
    job.run().unwrap();

    assert_eq!(fs::read(dst.join("tree/nested/b.txt")).unwrap(), b"bb");
    assert!(!src.exists());
}

#[test]
fn skipped_move_conflict_leaves_the_source_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_file_sync(src.join("f.txt"), b"new contents").unwrap();
    write_file_sync(dst.join("f.txt"), b"keep me").unwrap();

    let mut job = CopyJob::new(CopyAct::Move, vec![src.join("f.txt")], dst.clone())
        .with_conflict_resolver(|_, _| Resolution::Skip);
    job.run().unwrap();

    // Neither side may lose data on a skip
    assert_eq!(fs::read(src.join("f.txt")).unwrap(), b"new contents");
    assert_eq!(fs::read(dst.join("f.txt")).unwrap(), b"keep me");
}

#[test]
fn move_conflict_asks_exactly_once() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_file_sync(src.join("f.txt"), b"new contents").unwrap();
    write_file_sync(dst.join("f.txt"), b"stale").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_seen = Arc::clone(&calls);
    let mut job = CopyJob::new(CopyAct::Move, vec![src.join("f.txt")], dst.clone())
        .with_conflict_resolver(move |_, _| {
            calls_seen.fetch_add(1, Ordering::Relaxed);
            Resolution::Overwrite
        });
    job.run().unwrap();

    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(fs::read(dst.join("f.txt")).unwrap(), b"new contents");
    assert!(!src.join("f.txt").exists());
}

#[test]
fn moving_a_directory_into_itself_is_refused() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("tree");
    write_file_sync(src.join("a.txt"), b"a").unwrap();
    let dst = src.join("inner");
    fs::create_dir_all(&dst).unwrap();

    let mut job = CopyJob::new(CopyAct::Move, vec![src.clone()], dst);
    let err = job.run().unwrap_err();
    assert!(matches!(err, navcore::Error::DestinationInSource { .. }));
    // The source tree is intact
    assert!(src.join("a.txt").exists());
}
