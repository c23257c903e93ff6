//! Back/forward browsing history over visited directories.
//!
//! Two stacks, classic browser model: visiting a new location pushes the
//! current one onto the back stack and clears the forward stack. Locations
//! that vanished from disk are dropped at navigation time rather than
//! eagerly, so a remount can bring them back.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Oldest back entries are discarded past this depth.
pub const HISTORY_LIMIT: usize = 64;

#[derive(Debug, Default)]
pub struct BrowseHistory {
    back: VecDeque<PathBuf>,
    forward: Vec<PathBuf>,
    current: Option<PathBuf>,
    without_dupes: bool,
}

impl BrowseHistory {
    #[must_use]
    pub fn new(without_dupes: bool) -> Self {
        Self {
            without_dupes,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    #[must_use]
    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    /// Records a navigation to `loc`. Re-visiting the current location is a
    /// no-op; any forward trail is discarded.
    pub fn visit(&mut self, loc: &Path) {
        if self.current.as_deref() == Some(loc) {
            return;
        }
        if let Some(previous) = self.current.take() {
            if self.without_dupes {
                self.back.retain(|p| p != &previous);
            }
            self.back.push_back(previous);
            while self.back.len() > HISTORY_LIMIT {
                self.back.pop_front();
            }
        }
        self.forward.clear();
        self.current = Some(loc.to_path_buf());
    }

    /// Steps back to the most recent still-existing location, or None when
    /// the back stack is exhausted. Vanished locations are dropped.
    pub fn go_back(&mut self) -> Option<PathBuf> {
        while let Some(candidate) = self.back.pop_back() {
            if !candidate.exists() {
                log::debug!("Dropping vanished history entry {}", candidate.display());
                continue;
            }
            if let Some(current) = self.current.take() {
                self.forward.push(current);
            }
            self.current = Some(candidate.clone());
            return Some(candidate);
        }
        None
    }

    /// Steps forward to the most recent still-existing location, or None
    /// when the forward stack is exhausted.
    pub fn go_forward(&mut self) -> Option<PathBuf> {
        while let Some(candidate) = self.forward.pop() {
            if !candidate.exists() {
                log::debug!("Dropping vanished history entry {}", candidate.display());
                continue;
            }
            if let Some(current) = self.current.take() {
                if self.without_dupes {
                    self.back.retain(|p| p != &current);
                }
                self.back.push_back(current);
            }
            self.current = Some(candidate.clone());
            return Some(candidate);
        }
        None
    }
}
