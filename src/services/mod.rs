//! Core services for directory snapshots, change watching, and copying

pub mod copier;
pub mod format;
pub mod history;
pub mod selection;
pub mod snapshot;
pub mod view;
pub mod watch;
