//! File manager core library
//!
//! This library provides the toolkit-independent core of a desktop file
//! manager: an in-memory directory snapshot kept consistent with filesystem
//! watch events, a sorted and filtered view over it, selection accounting,
//! and a copy/move engine with progress reporting and caller-resolved
//! conflicts. A GUI or the bundled CLI drives these pieces; nothing in here
//! depends on an event loop or a widget toolkit.

pub mod cli;
pub mod io;
pub mod models;
pub mod services;

pub use models::{CopyError, Entry, FsEvent, FsEventKind, Notice, PathStats, SelectionStats};
pub use services::copier::{ConflictKind, CopyAct, CopyJob, JobState, Progress, Resolution};
pub use services::history::BrowseHistory;
pub use services::selection::SelectionTracker;
pub use services::snapshot::DirectorySnapshot;
pub use services::view::{SortKey, SortSpec, SortedView};
pub use services::watch::{ChangeCallback, ChangeFeed};

use std::path::PathBuf;
use std::result;

/// Custom error type for the library
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    InvalidInput(String),
    Watch(notify::Error),
    SameFile { src: PathBuf, dst: PathBuf },
    DestinationInSource { src: PathBuf, dst: PathBuf },
    Cancelled,
    PartialFailure { errors: Vec<CopyError> },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Error::Watch(e) => write!(f, "Watch error: {e}"),
            Error::SameFile { src, dst } => write!(
                f,
                "{} and {} are the same file",
                src.display(),
                dst.display()
            ),
            Error::DestinationInSource { src, dst } => write!(
                f,
                "Cannot move directory {} into itself {}",
                src.display(),
                dst.display()
            ),
            Error::Cancelled => write!(f, "Operation cancelled"),
            Error::PartialFailure { errors } => {
                write!(f, "Partial failure: {} item(s) failed", errors.len())
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Error::Watch(err)
    }
}

pub type Result<T> = result::Result<T, Error>;
