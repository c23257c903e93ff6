//! Data models for snapshot entries, aggregate stats, and notifications

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One filesystem object (file or directory) tracked in a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub name: String,
    /// Suffix without the leading dot; directories have none.
    pub extension: Option<String>,
    /// Logical size; 0 for directories.
    pub size_bytes: u64,
    pub modified_at: SystemTime,
    /// The directory this entry was listed from. A snapshot spanning several
    /// source paths (a merged trash view) carries entries from each of them.
    pub source_path: PathBuf,
    pub is_directory: bool,
    pub is_selected: bool,
    /// Trash listings only: when the object was trashed.
    pub deleted_at: Option<NaiveDateTime>,
    /// Trash listings only: where the object lived before deletion.
    pub origin_path: Option<PathBuf>,
}

impl Entry {
    /// Extension the way listings derive it: suffix without the dot.
    #[must_use]
    pub fn extension_of(name: &str) -> Option<String> {
        Path::new(name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
    }
}

/// Aggregate counters over a snapshot's entries.
///
/// Directories contribute 0 to `total_bytes`; their population is tracked
/// separately in `dir_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PathStats {
    pub file_count: u64,
    pub dir_count: u64,
    pub total_bytes: u64,
}

impl PathStats {
    pub fn absorb(&mut self, entry: &Entry) {
        if entry.is_directory {
            self.dir_count += 1;
        } else {
            self.file_count += 1;
            self.total_bytes += entry.size_bytes;
        }
    }

    pub fn release(&mut self, entry: &Entry) {
        if entry.is_directory {
            self.dir_count = self.dir_count.saturating_sub(1);
        } else {
            self.file_count = self.file_count.saturating_sub(1);
            self.total_bytes = self.total_bytes.saturating_sub(entry.size_bytes);
        }
    }
}

/// Running totals for selected entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStats {
    pub selected_count: u64,
    pub selected_bytes: u64,
}

/// A short human-readable status notification for the caller layer.
///
/// Mutation and listing operations return these instead of firing observer
/// signals inline; the hosting UI (or CLI) decides where they surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub topic: String,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn new(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            message: message.into(),
        }
    }
}

/// Simplified filesystem change kinds delivered by the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsEventKind {
    Created,
    Modified,
    Deleted,
    Moved,
}

/// A filesystem change event, already mapped from the OS notification layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub src_path: PathBuf,
    /// Populated for `Moved` events only.
    pub dest_path: Option<PathBuf>,
}

/// One failed item within a tree copy, reported in aggregate at the end.
#[derive(Debug, Clone, Serialize)]
pub struct CopyError {
    pub src: String,
    pub dst: String,
    pub message: String,
}

impl CopyError {
    pub(crate) fn record(src: &Path, dst: &Path, message: impl Into<String>) -> Self {
        Self {
            src: src.to_string_lossy().to_string(),
            dst: dst.to_string_lossy().to_string(),
            message: message.into(),
        }
    }
}
