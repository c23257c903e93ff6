//! In-memory directory snapshot and its mutation primitives.
//!
//! A snapshot is the authoritative mirror of one or more directories for a
//! single browsing context. It is populated by a full listing and then kept
//! current by the insert/update/rename/remove primitives the change feed
//! drives. Mutations racing a deletion are the normal case, not an error:
//! "not found" outcomes are swallowed and logged at debug level so a
//! `modified` event arriving just after a `deleted` can never resurrect an
//! entry.

use crate::models::{Entry, FsEvent, FsEventKind, Notice, PathStats, SelectionStats};
use crate::services::selection::SelectionTracker;
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Notification topic for listing status messages.
const TOPIC: &str = "snapshot";

/// Format of the `DeletionDate` key in XDG `.trashinfo` files.
const TRASHINFO_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Ordered collection of entries for one or more source paths, plus the
/// aggregates derived from them.
///
/// Entry order is whatever the OS listing produced; presentation order is a
/// separate concern owned by [`crate::SortedView`]. Exactly one logical owner
/// (one browsing context) may mutate a snapshot.
#[derive(Debug, Default)]
pub struct DirectorySnapshot {
    entries: Vec<Entry>,
    stats: PathStats,
    selection: SelectionTracker,
    sources: Vec<PathBuf>,
    is_trash: bool,
    last_read_at: Option<SystemTime>,
    generation: u64,
}

impl DirectorySnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn stats(&self) -> PathStats {
        self.stats
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    #[must_use]
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    #[must_use]
    pub fn is_trash(&self) -> bool {
        self.is_trash
    }

    #[must_use]
    pub fn last_read_at(&self) -> Option<SystemTime> {
        self.last_read_at
    }

    /// Monotonic counter bumped on every mutation; views use it to detect
    /// when a cached ordering went stale.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Performs a full synchronous read of `paths`, replacing all entries and
    /// aggregates. Previously selected names that survive the re-listing stay
    /// selected. Missing or unreadable paths yield an empty contribution and
    /// a status notice; they never raise.
    pub fn list(&mut self, paths: &[PathBuf], is_trash: bool) -> Vec<Notice> {
        let keep: HashSet<String> = self
            .entries
            .iter()
            .filter(|e| e.is_selected)
            .map(|e| e.name.clone())
            .collect();

        self.entries.clear();
        self.stats = PathStats::default();
        self.selection.reset();
        self.sources = paths.to_vec();
        self.is_trash = is_trash;
        self.last_read_at = Some(SystemTime::now());
        self.generation += 1;

        let mut notices = Vec::new();
        for path in paths {
            let outcome = if is_trash {
                self.list_trash_source(path, &keep)
            } else {
                self.list_source(path, &keep)
            };
            if let Err(err) = outcome {
                log::warn!("Listing {} failed: {err}", path.display());
                notices.push(Notice::new(
                    TOPIC,
                    format!("{} does not exist", path.display()),
                ));
            }
        }
        notices
    }

    fn list_source(&mut self, dir: &Path, keep: &HashSet<String>) -> std::io::Result<()> {
        for dir_entry in fs::read_dir(dir)? {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(err) => {
                    log::debug!("Skipping unreadable entry in {}: {err}", dir.display());
                    continue;
                }
            };
            let metadata = match dir_entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    // Racing a delete, or a broken symlink; skip it.
                    log::debug!(
                        "Skipping {}: {err}",
                        dir_entry.path().display()
                    );
                    continue;
                }
            };
            let name = dir_entry.file_name().to_string_lossy().to_string();
            self.push_listed(make_entry(&name, dir, &metadata), keep);
        }
        Ok(())
    }

    /// Trash mode reads `<trash>/files/` and pairs each entry with its
    /// `<trash>/info/<name>.trashinfo` metadata. Malformed or missing
    /// metadata never aborts the listing.
    fn list_trash_source(&mut self, trash_dir: &Path, keep: &HashSet<String>) -> std::io::Result<()> {
        let files_dir = trash_dir.join("files");
        for dir_entry in fs::read_dir(&files_dir)? {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(err) => {
                    log::debug!("Skipping unreadable entry in {}: {err}", files_dir.display());
                    continue;
                }
            };
            let metadata = match dir_entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    log::debug!("Skipping {}: {err}", dir_entry.path().display());
                    continue;
                }
            };
            let name = dir_entry.file_name().to_string_lossy().to_string();
            let mut entry = make_entry(&name, &files_dir, &metadata);
            if let Some((deleted_at, origin_path)) = read_trashinfo(trash_dir, &name) {
                entry.deleted_at = deleted_at;
                entry.origin_path = origin_path;
            }
            self.push_listed(entry, keep);
        }
        Ok(())
    }

    fn push_listed(&mut self, mut entry: Entry, keep: &HashSet<String>) {
        if keep.contains(&entry.name) {
            self.selection.mark_selected(&mut entry);
        }
        self.stats.absorb(&entry);
        self.entries.push(entry);
    }

    /// Adds one entry for a freshly created filesystem object. Returns false
    /// when an entry of that name already exists under the same source path,
    /// or when the object vanished before it could be stat'ed.
    pub fn insert(&mut self, full_path: &Path) -> bool {
        let Some((name, source)) = split_full_path(full_path) else {
            log::debug!("Insert with no file name: {}", full_path.display());
            return false;
        };
        if self
            .entries
            .iter()
            .any(|e| e.name == name && e.source_path == source)
        {
            return false;
        }
        let metadata = match fs::symlink_metadata(full_path) {
            Ok(m) => m,
            Err(err) => {
                // Created and deleted again before we got here.
                log::debug!("Insert raced a delete for {}: {err}", full_path.display());
                return false;
            }
        };
        let mut entry = make_entry(&name, &source, &metadata);
        if self.is_trash {
            if let Some(trash_dir) = source.parent() {
                if let Some((deleted_at, origin_path)) = read_trashinfo(trash_dir, &name) {
                    entry.deleted_at = deleted_at;
                    entry.origin_path = origin_path;
                }
            }
        }
        self.stats.absorb(&entry);
        self.entries.push(entry);
        self.generation += 1;
        true
    }

    /// Refreshes size and mtime for an existing entry. Not finding the entry,
    /// or the stat failing, is a benign race with a pending delete.
    pub fn update(&mut self, full_path: &Path) {
        let Some((name, source)) = split_full_path(full_path) else {
            return;
        };
        let Some(index) = self.find(&name, Some(&source)) else {
            log::debug!("Update for unknown entry {name}, likely racing a delete");
            return;
        };
        let metadata = match fs::symlink_metadata(full_path) {
            Ok(m) => m,
            Err(err) => {
                log::debug!("Update raced a delete for {}: {err}", full_path.display());
                return;
            }
        };
        let entry = &mut self.entries[index];
        if !entry.is_directory {
            let old_size = entry.size_bytes;
            let new_size = metadata.len();
            self.stats.total_bytes = self
                .stats
                .total_bytes
                .saturating_sub(old_size)
                .saturating_add(new_size);
            self.selection.resize(entry, old_size, new_size);
            entry.size_bytes = new_size;
        }
        entry.modified_at = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        self.generation += 1;
    }

    /// Renames a matching entry in place. Aggregates are untouched; a
    /// content change arrives as a separate `modified` event.
    pub fn rename(&mut self, old_name: &str, new_name: &str) {
        let old = Path::new(old_name);
        let Some(name) = file_name_of(old) else {
            return;
        };
        let source = parent_of(old);
        let Some(index) = self.find(&name, source.as_deref()) else {
            log::debug!("Rename for unknown entry {name}, likely racing a delete");
            return;
        };
        let Some(new) = file_name_of(Path::new(new_name)) else {
            return;
        };
        let entry = &mut self.entries[index];
        entry.extension = if entry.is_directory {
            None
        } else {
            Entry::extension_of(&new)
        };
        entry.name = new;
        self.generation += 1;
    }

    /// Removes a matching entry, releasing its aggregate and selection
    /// contributions. Returns false when nothing matched, which makes
    /// duplicate delete notifications idempotent.
    pub fn remove(&mut self, name_or_path: &str) -> bool {
        let path = Path::new(name_or_path);
        let Some(name) = file_name_of(path) else {
            return false;
        };
        let source = parent_of(path);
        let Some(index) = self.find(&name, source.as_deref()) else {
            return false;
        };
        let entry = self.entries.remove(index);
        self.stats.release(&entry);
        self.selection.release(&entry);
        self.generation += 1;
        true
    }

    /// Applies one change-feed event using the mutation primitives. Returns
    /// true if the snapshot changed.
    pub fn apply(&mut self, event: &FsEvent) -> bool {
        match event.kind {
            FsEventKind::Created => self.insert(&event.src_path),
            FsEventKind::Deleted => self.remove(&event.src_path.to_string_lossy()),
            FsEventKind::Modified => {
                self.update(&event.src_path);
                true
            }
            FsEventKind::Moved => {
                if let Some(dest) = &event.dest_path {
                    self.rename(
                        &event.src_path.to_string_lossy(),
                        &dest.to_string_lossy(),
                    );
                    true
                } else {
                    log::debug!("Moved event without destination: {:?}", event.src_path);
                    false
                }
            }
        }
    }

    /// True when any source path has been modified since the last listing or
    /// no longer exists. A vanished source forces a reload instead of
    /// silently presenting an empty view.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        let Some(last_read) = self.last_read_at else {
            return true;
        };
        self.sources.iter().any(|source| {
            let probe = if self.is_trash {
                source.join("files")
            } else {
                source.clone()
            };
            match fs::metadata(&probe).and_then(|m| m.modified()) {
                Ok(mtime) => mtime > last_read,
                Err(_) => true,
            }
        })
    }

    /// Toggles selection for the entry at `row` (source order).
    pub fn toggle(&mut self, row: usize) {
        if let Some(entry) = self.entries.get_mut(row) {
            self.selection.toggle(entry);
        }
    }

    /// Authoritative selection scan; equals the running totals by invariant.
    pub fn recompute_selection(&self) -> SelectionStats {
        self.selection.recompute(&self.entries)
    }

    fn find(&self, name: &str, source: Option<&Path>) -> Option<usize> {
        self.entries.iter().position(|e| {
            e.name == name && source.is_none_or(|s| e.source_path == s)
        })
    }
}

fn make_entry(name: &str, source: &Path, metadata: &fs::Metadata) -> Entry {
    let is_directory = metadata.is_dir();
    Entry {
        name: name.to_string(),
        extension: if is_directory {
            None
        } else {
            Entry::extension_of(name)
        },
        size_bytes: if is_directory { 0 } else { metadata.len() },
        modified_at: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        source_path: source.to_path_buf(),
        is_directory,
        is_selected: false,
        deleted_at: None,
        origin_path: None,
    }
}

fn split_full_path(path: &Path) -> Option<(String, PathBuf)> {
    let name = file_name_of(path)?;
    let source = path.parent()?.to_path_buf();
    Some((name, source))
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}

fn parent_of(path: &Path) -> Option<PathBuf> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Parses `<trash>/info/<name>.trashinfo`, recognizing the `DeletionDate`
/// and `Path` keys. A relative `Path` is resolved against the trash folder's
/// parent (its mount point). Malformed files are logged and yield nothing.
fn read_trashinfo(trash_dir: &Path, name: &str) -> Option<(Option<NaiveDateTime>, Option<PathBuf>)> {
    let info_path = trash_dir.join("info").join(format!("{name}.trashinfo"));
    let contents = match fs::read_to_string(&info_path) {
        Ok(c) => c,
        Err(err) => {
            log::debug!("No trashinfo for {name}: {err}");
            return None;
        }
    };

    let mut deleted_at = None;
    let mut origin_path = None;
    for line in contents.lines() {
        let line = line.trim();
        if let Some(stamp) = line.strip_prefix("DeletionDate=") {
            match NaiveDateTime::parse_from_str(stamp, TRASHINFO_DATE_FORMAT) {
                Ok(parsed) => deleted_at = Some(parsed),
                Err(err) => {
                    log::debug!("Malformed DeletionDate in {}: {err}", info_path.display());
                }
            }
        } else if let Some(raw) = line.strip_prefix("Path=") {
            let path = Path::new(raw);
            if path.is_absolute() {
                origin_path = Some(path.to_path_buf());
            } else {
                let mount = trash_dir.parent().unwrap_or(trash_dir);
                origin_path = Some(mount.join(path));
            }
        }
    }
    Some((deleted_at, origin_path))
}
