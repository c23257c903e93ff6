//! Selection accounting over snapshot entries.
//!
//! The tracker keeps `selected_count`/`selected_bytes` as running totals so
//! the common toggle path never rescans the entry collection. A full
//! `recompute` over the entries is authoritative and must always agree with
//! the running totals; tests rely on that equivalence.

use crate::models::{Entry, SelectionStats};
use std::sync::Mutex;

/// Running selection totals, safe to adjust from UI dispatch threads.
///
/// The mutex here is the only lock in the snapshot layer; snapshot mutation
/// itself has exactly one logical owner and is not internally synchronized.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    totals: Mutex<SelectionStats>,
}

impl SelectionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current running totals.
    #[must_use]
    pub fn stats(&self) -> SelectionStats {
        *self.totals.lock().unwrap()
    }

    /// Drops all running totals, used when a listing is replaced wholesale.
    pub fn reset(&self) {
        *self.totals.lock().unwrap() = SelectionStats::default();
    }

    /// Flips the selection state of `entry`, adjusting the running totals.
    /// Directories count toward `selected_count` but contribute 0 bytes.
    pub fn toggle(&self, entry: &mut Entry) {
        let mut totals = self.totals.lock().unwrap();
        let bytes = if entry.is_directory {
            0
        } else {
            entry.size_bytes
        };
        if entry.is_selected {
            entry.is_selected = false;
            totals.selected_count = totals.selected_count.saturating_sub(1);
            totals.selected_bytes = totals.selected_bytes.saturating_sub(bytes);
        } else {
            entry.is_selected = true;
            totals.selected_count += 1;
            totals.selected_bytes += bytes;
        }
    }

    /// Marks an entry selected during a re-listing that restores a previous
    /// selection. No-op if the entry is already selected.
    pub fn mark_selected(&self, entry: &mut Entry) {
        if !entry.is_selected {
            self.toggle(entry);
        }
    }

    /// Removes a (possibly selected) entry's contribution, used when the
    /// entry leaves the snapshot.
    pub fn release(&self, entry: &Entry) {
        if !entry.is_selected {
            return;
        }
        let mut totals = self.totals.lock().unwrap();
        totals.selected_count = totals.selected_count.saturating_sub(1);
        if !entry.is_directory {
            totals.selected_bytes = totals.selected_bytes.saturating_sub(entry.size_bytes);
        }
    }

    /// Adjusts byte totals when a selected file's size changes under it.
    pub fn resize(&self, entry: &Entry, old_size: u64, new_size: u64) {
        if !entry.is_selected || entry.is_directory {
            return;
        }
        let mut totals = self.totals.lock().unwrap();
        totals.selected_bytes = totals
            .selected_bytes
            .saturating_sub(old_size)
            .saturating_add(new_size);
    }

    /// Authoritative full scan. Replaces the running totals with the scan
    /// result and returns it; used after bulk operations (select-all,
    /// invert) where incremental tracking would iterate anyway.
    pub fn recompute(&self, entries: &[Entry]) -> SelectionStats {
        let mut fresh = SelectionStats::default();
        for entry in entries.iter().filter(|e| e.is_selected) {
            fresh.selected_count += 1;
            if !entry.is_directory {
                fresh.selected_bytes += entry.size_bytes;
            }
        }
        *self.totals.lock().unwrap() = fresh;
        fresh
    }
}
