//! Copy/move engine with progress reporting and caller-resolved conflicts.
//!
//! Each job walks `Sizing -> Copying -> Done` (or `Failed`). Conflicts
//! (destination exists) are surfaced through an injected resolver, never a
//! hardcoded prompt. Tree copies are not atomic: individual file failures
//! are accumulated and reported once at the end, and whatever copied stays
//! on disk. Moves try an atomic rename first and only fall back to
//! copy-then-delete, removing the source exclusively after the copy fully
//! completed.

use crate::models::CopyError;
use crate::{Error, Result};
use filetime::FileTime;
use rayon::prelude::*;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Streamed copies run in chunks of this size, with a progress callback
/// after every chunk.
pub const CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyAct {
    Copy,
    Move,
}

impl CopyAct {
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "copy" => Some(CopyAct::Copy),
            "move" => Some(CopyAct::Move),
            _ => None,
        }
    }
}

/// What kind of object the conflict is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    File,
    Directory,
}

/// Caller's decision for an existing destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Overwrite,
    Merge,
    Skip,
}

impl Resolution {
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "overwrite" => Some(Resolution::Overwrite),
            "merge" => Some(Resolution::Merge),
            "skip" => Some(Resolution::Skip),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Sizing,
    Copying,
    Done,
    Failed,
}

/// Advisory progress figures. All derived values degrade to None instead of
/// dividing by zero.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub bytes_copied: u64,
    pub bytes_total: u64,
    pub elapsed: Duration,
}

impl Progress {
    /// Completion percentage, or None when the total is unknown/zero.
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        if self.bytes_total == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.bytes_copied as f64 / self.bytes_total as f64;
        Some(ratio * 100.0)
    }

    /// Transfer rate in bytes per second, or None before any time elapsed.
    #[must_use]
    pub fn rate(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let copied = self.bytes_copied as f64;
        Some(copied / secs)
    }

    /// Estimated remaining time, or None when the rate is unknown or zero.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        let rate = self.rate()?;
        if rate <= 0.0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let left = self.bytes_total.saturating_sub(self.bytes_copied) as f64;
        Some(Duration::from_secs_f64(left / rate))
    }
}

type ProgressFn = dyn Fn(&Progress) + Send;
type ConflictFn = dyn Fn(ConflictKind, &Path) -> Resolution + Send;

/// One copy or move invocation: a list of sources into one destination
/// directory. Created per call, discarded when it completes or fails.
pub struct CopyJob {
    act: CopyAct,
    sources: Vec<PathBuf>,
    destination: PathBuf,
    bytes_copied: u64,
    bytes_total: u64,
    started: Instant,
    state: JobState,
    cancel: Arc<AtomicBool>,
    on_progress: Option<Box<ProgressFn>>,
    resolve: Box<ConflictFn>,
}

impl CopyJob {
    #[must_use]
    pub fn new(act: CopyAct, sources: Vec<PathBuf>, destination: PathBuf) -> Self {
        Self {
            act,
            sources,
            destination,
            bytes_copied: 0,
            bytes_total: 0,
            started: Instant::now(),
            state: JobState::Sizing,
            cancel: Arc::new(AtomicBool::new(false)),
            on_progress: None,
            // Batch-safe default: never clobber without being told to.
            resolve: Box::new(|_, _| Resolution::Skip),
        }
    }

    /// Installs the progress callback, invoked once per copied chunk. The
    /// engine does not throttle; debouncing is the caller's concern.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Progress) + Send + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Installs the conflict resolver consulted before overwriting or
    /// merging anything that already exists at the destination.
    #[must_use]
    pub fn with_conflict_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(ConflictKind, &Path) -> Resolution + Send + 'static,
    {
        self.resolve = Box::new(resolver);
        self
    }

    /// Shared flag a host can set to stop the job between chunks. Partial
    /// files are left as-is; there is no rollback.
    #[must_use]
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    #[must_use]
    pub fn state(&self) -> JobState {
        self.state
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            bytes_copied: self.bytes_copied,
            bytes_total: self.bytes_total,
            elapsed: self.started.elapsed(),
        }
    }

    /// Runs the job to completion. Per-file failures inside tree copies are
    /// accumulated and reported once as [`Error::PartialFailure`]; a fatal
    /// error (or cancellation) stops the job where it stands.
    pub fn run(&mut self) -> Result<()> {
        self.state = JobState::Sizing;
        self.bytes_total = estimate_size(&self.sources);
        self.started = Instant::now();
        self.state = JobState::Copying;

        let sources = self.sources.clone();
        let destination = self.destination.clone();
        let mut errors: Vec<CopyError> = Vec::new();
        for src in &sources {
            if self.cancelled() {
                self.state = JobState::Failed;
                return Err(Error::Cancelled);
            }
            let outcome = match self.act {
                CopyAct::Copy => {
                    log::debug!("Now copying {}", src.display());
                    if src.is_dir() {
                        let dst = match join_basename(&destination, src) {
                            Some(d) => d,
                            None => continue,
                        };
                        self.copy_tree_inner(src, &dst, true)
                    } else {
                        self.copy_file(src, &destination).map(|_| ())
                    }
                }
                CopyAct::Move => {
                    log::debug!("Now moving {}", src.display());
                    self.move_path(src, &destination)
                }
            };
            match outcome {
                Ok(()) => {}
                Err(Error::PartialFailure { errors: sub }) => errors.extend(sub),
                Err(Error::Cancelled) => {
                    self.state = JobState::Failed;
                    return Err(Error::Cancelled);
                }
                Err(fatal) => {
                    log::error!("Job failed on {}: {fatal}", src.display());
                    self.state = JobState::Failed;
                    return Err(fatal);
                }
            }
        }

        if errors.is_empty() {
            self.state = JobState::Done;
            Ok(())
        } else {
            self.state = JobState::Failed;
            Err(Error::PartialFailure { errors })
        }
    }

    /// Streams one file to `dst` (or into it when `dst` is a directory) in
    /// [`CHUNK_SIZE`] chunks, reporting progress after every chunk. Returns
    /// the bytes written, 0 when the caller's resolver skipped the conflict.
    pub fn copy_file(&mut self, src: &Path, dst: &Path) -> Result<u64> {
        Ok(self.copy_file_inner(src, dst, true)?.unwrap_or(0))
    }

    /// Recursively mirrors `src_dir` into `dst_dir`, consulting the conflict
    /// resolver for existing directories and continuing past individual file
    /// errors.
    pub fn copy_tree(&mut self, src_dir: &Path, dst_dir: &Path) -> Result<()> {
        self.copy_tree_inner(src_dir, dst_dir, true)
    }

    /// Moves `src` into the `dst` directory (or onto `dst` itself). Same
    /// filesystem is a single rename; otherwise falls back to symlink
    /// recreation, tree copy plus delete, or file copy plus unlink. The
    /// source is only removed once the destination fully exists.
    pub fn move_path(&mut self, src: &Path, dst: &Path) -> Result<()> {
        let mut real_dst = dst.to_path_buf();
        let mut preresolved = false;
        if dst.is_dir() {
            if same_file(src, dst) {
                // Case-insensitive filesystem rename; perform it anyway.
                fs::rename(src, dst)?;
                return Ok(());
            }
            real_dst = join_basename(dst, src)
                .ok_or_else(|| Error::InvalidInput(format!("{} has no name", src.display())))?;
            if real_dst.exists() {
                let kind = if real_dst.is_dir() {
                    ConflictKind::Directory
                } else {
                    ConflictKind::File
                };
                match (self.resolve)(kind, &real_dst) {
                    Resolution::Skip => return Ok(()),
                    Resolution::Overwrite | Resolution::Merge => preresolved = true,
                }
            }
        }

        let size = estimate_size(std::slice::from_ref(&src.to_path_buf()));
        log::debug!("Trying rename from {} to {}", src.display(), real_dst.display());
        match fs::rename(src, &real_dst) {
            Ok(()) => {
                self.bytes_copied += size;
                self.emit_progress();
                Ok(())
            }
            Err(err) => {
                log::debug!(
                    "Rename from {} to {} failed ({err}), trying alternatives",
                    src.display(),
                    real_dst.display()
                );
                let metadata = fs::symlink_metadata(src)?;
                if metadata.is_symlink() {
                    let target = fs::read_link(src)?;
                    make_symlink(&target, &real_dst)?;
                    fs::remove_file(src)?;
                    self.bytes_copied += size;
                    self.emit_progress();
                } else if metadata.is_dir() {
                    if destination_in_source(src, dst) {
                        return Err(Error::DestinationInSource {
                            src: src.to_path_buf(),
                            dst: dst.to_path_buf(),
                        });
                    }
                    log::debug!("Copy tree from {} to {}", src.display(), real_dst.display());
                    self.copy_tree_inner(src, &real_dst, !preresolved)?;
                    // Copy completed in full; now the source may go.
                    fs::remove_dir_all(src)?;
                } else {
                    log::debug!("Copy file from {} to {}", src.display(), real_dst.display());
                    let copied = self.copy_file_inner(src, &real_dst, !preresolved)?;
                    if copied.is_some() {
                        fs::remove_file(src)?;
                    }
                }
                Ok(())
            }
        }
    }

    /// None means the conflict resolver skipped the file.
    fn copy_file_inner(&mut self, src: &Path, dst: &Path, ask: bool) -> Result<Option<u64>> {
        let dst = if dst.is_dir() {
            join_basename(dst, src)
                .ok_or_else(|| Error::InvalidInput(format!("{} has no name", src.display())))?
        } else {
            dst.to_path_buf()
        };
        if same_file(src, &dst) {
            return Err(Error::SameFile {
                src: src.to_path_buf(),
                dst,
            });
        }
        if ask && dst.exists() {
            match (self.resolve)(ConflictKind::File, &dst) {
                Resolution::Skip => return Ok(None),
                Resolution::Overwrite | Resolution::Merge => {}
            }
        }

        let mut reader = fs::File::open(src)?;
        let mut writer = fs::File::create(&dst)?;
        let mut buffer = [0u8; CHUNK_SIZE];
        let mut written: u64 = 0;
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            writer.write_all(&buffer[..read])?;
            written += read as u64;
            self.bytes_copied += read as u64;
            self.emit_progress();
            if self.cancelled() {
                // Partial file stays; no rollback on cancellation.
                return Err(Error::Cancelled);
            }
        }
        drop(writer);
        copy_stat(src, &dst)?;
        Ok(Some(written))
    }

    fn copy_tree_inner(&mut self, src_dir: &Path, dst_dir: &Path, ask: bool) -> Result<()> {
        match fs::create_dir(dst_dir) {
            Ok(()) => log::debug!("Directory created: {}", dst_dir.display()),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                if ask {
                    match (self.resolve)(ConflictKind::Directory, dst_dir) {
                        Resolution::Skip => return Ok(()),
                        Resolution::Merge | Resolution::Overwrite => {}
                    }
                }
            }
            Err(err) => return Err(err.into()),
        }

        let mut errors: Vec<CopyError> = Vec::new();
        for dir_entry in fs::read_dir(src_dir)? {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(err) => {
                    errors.push(CopyError::record(src_dir, dst_dir, err.to_string()));
                    continue;
                }
            };
            let src_name = dir_entry.path();
            let dst_name = dst_dir.join(dir_entry.file_name());
            let metadata = match fs::symlink_metadata(&src_name) {
                Ok(m) => m,
                Err(err) => {
                    errors.push(CopyError::record(&src_name, &dst_name, err.to_string()));
                    continue;
                }
            };
            let outcome = if metadata.is_symlink() {
                fs::read_link(&src_name)
                    .and_then(|target| make_symlink_io(&target, &dst_name))
                    .map_err(Error::Io)
            } else if metadata.is_dir() {
                self.copy_tree_inner(&src_name, &dst_name, true)
            } else {
                self.copy_file_inner(&src_name, &dst_name, true).map(|_| ())
            };
            match outcome {
                Ok(()) => {}
                Err(Error::PartialFailure { errors: sub }) => errors.extend(sub),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => {
                    errors.push(CopyError::record(&src_name, &dst_name, err.to_string()));
                }
            }
        }

        if let Err(err) = copy_stat(src_dir, dst_dir) {
            errors.push(CopyError::record(src_dir, dst_dir, err.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::PartialFailure { errors })
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn emit_progress(&self) {
        if let Some(callback) = &self.on_progress {
            callback(&self.progress());
        }
    }
}

impl std::fmt::Debug for CopyJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopyJob")
            .field("act", &self.act)
            .field("sources", &self.sources)
            .field("destination", &self.destination)
            .field("bytes_copied", &self.bytes_copied)
            .field("bytes_total", &self.bytes_total)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Recursively sums file sizes under each source. Descendants that fail to
/// stat are skipped; the estimate never aborts.
#[must_use]
pub fn estimate_size(paths: &[PathBuf]) -> u64 {
    paths.par_iter().map(|path| path_size(path)).sum()
}

fn path_size(path: &Path) -> u64 {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(err) => {
            log::debug!("Skipping {} during sizing: {err}", path.display());
            return 0;
        }
    };
    if metadata.is_dir() {
        let entries = match fs::read_dir(path) {
            Ok(e) => e,
            Err(err) => {
                log::debug!("Skipping {} during sizing: {err}", path.display());
                return 0;
            }
        };
        entries
            .filter_map(std::result::Result::ok)
            .map(|entry| path_size(&entry.path()))
            .sum()
    } else if metadata.is_file() {
        metadata.len()
    } else {
        0
    }
}

fn join_basename(dir: &Path, src: &Path) -> Option<PathBuf> {
    src.file_name().map(|name| dir.join(name))
}

/// Replicates permissions and mtime after the data copy completed.
fn copy_stat(src: &Path, dst: &Path) -> std::io::Result<()> {
    let metadata = fs::metadata(src)?;
    fs::set_permissions(dst, metadata.permissions())?;
    filetime::set_file_mtime(dst, FileTime::from_last_modification_time(&metadata))?;
    Ok(())
}

#[cfg(unix)]
fn make_symlink_io(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink_io(target: &Path, link: &Path) -> std::io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(not(any(unix, windows)))]
fn make_symlink_io(_target: &Path, link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("symlinks unsupported, cannot create {}", link.display()),
    ))
}

fn make_symlink(target: &Path, link: &Path) -> Result<()> {
    make_symlink_io(target, link).map_err(Error::Io)
}

/// True when both paths resolve to the same filesystem object.
#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

/// True when `dst` lives inside `src`, which would make a directory move
/// recurse into itself.
fn destination_in_source(src: &Path, dst: &Path) -> bool {
    let src = fs::canonicalize(src).unwrap_or_else(|_| src.to_path_buf());
    let dst = fs::canonicalize(dst).unwrap_or_else(|_| dst.to_path_buf());
    dst.starts_with(&src)
}
