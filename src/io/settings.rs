//! View settings loaded from a JSON file.
//!
//! Settings are read per call rather than cached, so an edited file takes
//! effect on the next listing. A missing or malformed file yields the
//! defaults. Writing the file is the hosting application's job; this layer
//! only consumes it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Presentation preferences consulted when building a view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewSettings {
    /// Group directories before files regardless of sort direction.
    #[serde(default = "default_true")]
    pub sort_folders_first: bool,
    /// Keep at most one copy of each location in browsing history.
    #[serde(default = "default_true")]
    pub history_without_dupes: bool,
    /// Substring filters ignore case unless set.
    #[serde(default)]
    pub filter_case_sensitive: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            sort_folders_first: true,
            history_without_dupes: true,
            filter_case_sensitive: false,
        }
    }
}

impl ViewSettings {
    /// Loads settings from `path`, falling back to the defaults when the
    /// file is absent or does not parse.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(settings) => settings,
                Err(err) => {
                    log::warn!("Malformed settings file {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                log::debug!("No settings at {} ({err}), using defaults", path.display());
                Self::default()
            }
        }
    }
}
