//! Sorted, filtered projection over a directory snapshot.
//!
//! The view never mutates the snapshot; it keeps a cached row ordering keyed
//! on the snapshot's generation counter and rebuilds it lazily on access.
//! Ordering is total and deterministic: directories group before files when
//! folders-first is on (independent of sort direction), absent values sort
//! smallest, and equal keys keep insertion order via stable sort.

use crate::models::Entry;
use crate::services::snapshot::DirectorySnapshot;
use std::cmp::Ordering;

/// Sortable columns of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Extension,
    Size,
    Modified,
}

impl SortKey {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Extension => "ext",
            SortKey::Size => "size",
            SortKey::Modified => "modified",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "name" => Some(SortKey::Name),
            "ext" | "extension" => Some(SortKey::Extension),
            "size" => Some(SortKey::Size),
            "modified" | "mtime" => Some(SortKey::Modified),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::from_label(s).ok_or_else(|| format!("unknown sort key '{s}'"))
    }
}

/// Complete sort configuration for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub ascending: bool,
    pub folders_first: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::Name,
            ascending: true,
            folders_first: true,
        }
    }
}

/// Derived projection: filtered row set in sorted order, by source index.
#[derive(Debug, Default)]
pub struct SortedView {
    spec: SortSpec,
    filter: String,
    case_sensitive: bool,
    rows: Vec<usize>,
    seen_generation: Option<u64>,
}

impl SortedView {
    #[must_use]
    pub fn new(spec: SortSpec) -> Self {
        Self {
            spec,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn spec(&self) -> SortSpec {
        self.spec
    }

    pub fn set_sort(&mut self, spec: SortSpec) {
        if self.spec != spec {
            self.spec = spec;
            self.seen_generation = None;
        }
    }

    /// Sets the substring filter. An empty string matches everything.
    /// Filtering hides rows; it never touches their selection state.
    pub fn set_filter(&mut self, filter: &str, case_sensitive: bool) {
        if self.filter != filter || self.case_sensitive != case_sensitive {
            self.filter = filter.to_string();
            self.case_sensitive = case_sensitive;
            self.seen_generation = None;
        }
    }

    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Number of rows currently visible.
    pub fn row_count(&mut self, snapshot: &DirectorySnapshot) -> usize {
        self.sync(snapshot);
        self.rows.len()
    }

    /// Entry at a view row, or None past the end.
    pub fn entry_at<'a>(
        &mut self,
        snapshot: &'a DirectorySnapshot,
        row: usize,
    ) -> Option<&'a Entry> {
        self.sync(snapshot);
        self.rows.get(row).map(|&i| &snapshot.entries()[i])
    }

    /// Source index (snapshot order) of a view row.
    pub fn source_index(&mut self, snapshot: &DirectorySnapshot, row: usize) -> Option<usize> {
        self.sync(snapshot);
        self.rows.get(row).copied()
    }

    /// Next row for wrap-around navigation. None when the view is empty or,
    /// in non-cyclic mode, at the last row.
    pub fn next_index(
        &mut self,
        snapshot: &DirectorySnapshot,
        row: usize,
        cyclic: bool,
    ) -> Option<usize> {
        let count = self.row_count(snapshot);
        if count == 0 {
            return None;
        }
        if row + 1 < count {
            Some(row + 1)
        } else if cyclic {
            Some(0)
        } else {
            None
        }
    }

    /// Previous row for wrap-around navigation. None when the view is empty
    /// or, in non-cyclic mode, at the first row.
    pub fn previous_index(
        &mut self,
        snapshot: &DirectorySnapshot,
        row: usize,
        cyclic: bool,
    ) -> Option<usize> {
        let count = self.row_count(snapshot);
        if count == 0 {
            return None;
        }
        if row > 0 {
            Some(row.min(count) - 1)
        } else if cyclic {
            Some(count - 1)
        } else {
            None
        }
    }

    /// Total ordering used by the view. Folders group first regardless of
    /// direction when `folders_first` is set; the direction applies to the
    /// key comparison within each group.
    #[must_use]
    pub fn compare(a: &Entry, b: &Entry, spec: SortSpec) -> Ordering {
        if spec.folders_first && a.is_directory != b.is_directory {
            return if a.is_directory {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        let by_key = match spec.key {
            SortKey::Name => a.name.cmp(&b.name),
            // None (directories) sorts smallest, keeping the order total.
            SortKey::Extension => a.extension.cmp(&b.extension),
            SortKey::Size => a.size_bytes.cmp(&b.size_bytes),
            SortKey::Modified => a.modified_at.cmp(&b.modified_at),
        };
        if spec.ascending { by_key } else { by_key.reverse() }
    }

    fn matches(&self, entry: &Entry) -> bool {
        if self.filter.is_empty() {
            return true;
        }
        if self.case_sensitive {
            entry.name.contains(&self.filter)
        } else {
            entry
                .name
                .to_lowercase()
                .contains(&self.filter.to_lowercase())
        }
    }

    fn sync(&mut self, snapshot: &DirectorySnapshot) {
        if self.seen_generation == Some(snapshot.generation()) {
            return;
        }
        let entries = snapshot.entries();
        self.rows = (0..entries.len())
            .filter(|&i| self.matches(&entries[i]))
            .collect();
        let spec = self.spec;
        // Stable sort: equal keys keep insertion order.
        self.rows
            .sort_by(|&l, &r| Self::compare(&entries[l], &entries[r], spec));
        self.seen_generation = Some(snapshot.generation());
    }
}
