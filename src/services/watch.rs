//! Change feed bridging OS filesystem notifications to snapshot mutations.
//!
//! One service object owns a single OS watcher and a registry mapping each
//! watched path to its callback set. A path is watched by the OS at most
//! once no matter how many callbacks are registered; removing the last
//! callback tears the OS watch down. Dispatch resolves the parent directory
//! of the event's source path and invokes every callback registered for that
//! exact parent; events for unregistered parents are expected and dropped.

use crate::models::{FsEvent, FsEventKind};
use crate::Result;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

static NEXT_CALLBACK_ID: AtomicU64 = AtomicU64::new(1);

/// A registered event callback with a process-unique identity.
///
/// Rust closures are not comparable, so the handle carries a token id
/// assigned at construction; clones share it, which is what gives
/// [`ChangeFeed::add_path`] its set semantics.
#[derive(Clone)]
pub struct ChangeCallback {
    id: u64,
    func: Arc<dyn Fn(&FsEvent, &Path) + Send + Sync>,
}

impl ChangeCallback {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&FsEvent, &Path) + Send + Sync + 'static,
    {
        Self {
            id: NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed),
            func: Arc::new(func),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    fn invoke(&self, event: &FsEvent, watched: &Path) {
        (self.func)(event, watched);
    }
}

impl std::fmt::Debug for ChangeCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeCallback").field("id", &self.id).finish()
    }
}

/// Registration state for one watched path.
#[derive(Debug, Default)]
struct WatchRegistration {
    callbacks: Vec<ChangeCallback>,
}

#[derive(Debug, Default)]
struct FeedState {
    monitored: HashMap<PathBuf, WatchRegistration>,
    running: bool,
}

/// Process-wide change notification registry.
///
/// Construct once, inject into callers, call [`ChangeFeed::stop`] at
/// shutdown. All registry mutation happens behind one lock; callbacks are
/// invoked after the lock is released. The lock is never held across a
/// `watch`/`unwatch` call: those are synchronous round-trips to the OS
/// watcher thread, and that thread takes the same lock in [`dispatch`].
pub struct ChangeFeed {
    state: Arc<Mutex<FeedState>>,
    watcher: Mutex<RecommendedWatcher>,
}

impl ChangeFeed {
    /// Creates the feed and its OS watcher. Events are ignored until
    /// [`ChangeFeed::start`] is called.
    pub fn new() -> Result<Self> {
        let state = Arc::new(Mutex::new(FeedState::default()));
        let dispatch_state = Arc::clone(&state);
        let watcher = RecommendedWatcher::new(
            move |outcome: notify::Result<Event>| match outcome {
                Ok(event) => dispatch(&dispatch_state, &event),
                Err(err) => log::warn!("Watcher delivered an error: {err}"),
            },
            Config::default(),
        )?;
        Ok(Self {
            state,
            watcher: Mutex::new(watcher),
        })
    }

    /// Enables dispatch. Idempotent.
    pub fn start(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.running {
            state.running = true;
            log::debug!("Change feed started");
        }
    }

    /// Tears down every active registration and disables dispatch.
    pub fn stop(&self) {
        let paths: Vec<PathBuf> = {
            let mut state = self.state.lock().unwrap();
            state.running = false;
            state.monitored.drain().map(|(path, _)| path).collect()
        };
        let mut watcher = self.watcher.lock().unwrap();
        for path in &paths {
            if let Err(err) = watcher.unwatch(path) {
                log::warn!("Error unscheduling watch for {}: {err}", path.display());
            }
        }
        log::debug!("Change feed stopped");
    }

    /// Registers `callback` for events under `loc`. The first registration
    /// for a path establishes the OS watch; later ones reuse it. Registering
    /// the same callback twice is a no-op. A missing path logs a warning and
    /// registers nothing.
    pub fn add_path(&self, loc: &Path, callback: &ChangeCallback) {
        if !loc.exists() {
            log::warn!("{} no longer exists", loc.display());
            return;
        }
        {
            let mut state = self.state.lock().unwrap();
            if let Some(registration) = state.monitored.get_mut(loc) {
                if registration.callbacks.iter().all(|cb| cb.id != callback.id) {
                    registration.callbacks.push(callback.clone());
                    log::debug!("Callback {} registered for {}", callback.id, loc.display());
                }
                return;
            }
            // Reserve the slot so a racing add_path reuses it instead of
            // issuing a second OS watch.
            state.monitored.insert(
                loc.to_path_buf(),
                WatchRegistration {
                    callbacks: vec![callback.clone()],
                },
            );
        }
        let outcome = self
            .watcher
            .lock()
            .unwrap()
            .watch(loc, RecursiveMode::NonRecursive);
        match outcome {
            Ok(()) => {
                log::debug!("Monitoring started for {}", loc.display());
            }
            Err(err) => {
                log::warn!("Could not watch {}: {err}", loc.display());
                self.state.lock().unwrap().monitored.remove(loc);
            }
        }
    }

    /// Removes `callback` from `loc`; tearing down the OS watch when the
    /// callback set becomes empty. Unknown paths or callbacks are tolerated.
    pub fn remove_path(&self, loc: &Path, callback: &ChangeCallback) {
        let teardown = {
            let mut state = self.state.lock().unwrap();
            let Some(registration) = state.monitored.get_mut(loc) else {
                log::debug!("No registration for {}", loc.display());
                return;
            };
            registration.callbacks.retain(|cb| cb.id != callback.id);
            if registration.callbacks.is_empty() {
                state.monitored.remove(loc);
                true
            } else {
                false
            }
        };
        if teardown {
            if let Err(err) = self.watcher.lock().unwrap().unwatch(loc) {
                log::warn!("Error unscheduling watch for {}: {err}", loc.display());
            }
            log::debug!("Stopped monitoring {} as no callbacks remain", loc.display());
        }
    }

    /// Number of active path registrations, for callers and tests.
    #[must_use]
    pub fn watched_paths(&self) -> usize {
        self.state.lock().unwrap().monitored.len()
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn dispatch(state: &Arc<Mutex<FeedState>>, raw: &Event) {
    let Some(event) = map_event(raw) else {
        return;
    };
    let Some(parent) = event.src_path.parent().map(Path::to_path_buf) else {
        return;
    };
    let callbacks = {
        let state = state.lock().unwrap();
        if !state.running {
            return;
        }
        match state.monitored.get(&parent) {
            Some(registration) => registration.callbacks.clone(),
            // Expected for parents nobody tracks.
            None => return,
        }
    };
    log::debug!("Change detected in {}", parent.display());
    for callback in &callbacks {
        callback.invoke(&event, &parent);
    }
}

/// Maps a raw notify event to the simplified feed event, or None for kinds
/// the snapshot layer has no use for (access, metadata-only noise is kept
/// as `Modified` since listings show mtime).
fn map_event(raw: &Event) -> Option<FsEvent> {
    let src_path = raw.paths.first()?.clone();
    let (kind, dest_path) = match raw.kind {
        EventKind::Create(_) => (FsEventKind::Created, None),
        EventKind::Remove(_) => (FsEventKind::Deleted, None),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            (FsEventKind::Moved, raw.paths.get(1).cloned())
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => (FsEventKind::Deleted, None),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => (FsEventKind::Created, None),
        EventKind::Modify(_) => (FsEventKind::Modified, None),
        _ => return None,
    };
    Some(FsEvent {
        kind,
        src_path,
        dest_path,
    })
}
