//! Watch on the desired-state file.
//!
//! The watch is placed on the file itself, not its directory. When the
//! controlling application replaces the file (write to a sibling, rename over)
//! the watched inode goes away and the watch is stale; the runtime then calls
//! [`ConfigWatcher::establish`] again to watch the new file at the same path.

use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{recommended_watcher, Event as FsEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::DaemonError;
use crate::event::Event;
use crate::retry::Scheduler;

/// How a file event affects the watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    /// Contents or attributes changed in place; the watch is still valid.
    Modified,
    /// Deleted or renamed; the watch must be re-established.
    Replaced,
}

pub fn classify(kind: &EventKind) -> Option<FileChange> {
    match kind {
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_)) => Some(FileChange::Replaced),
        EventKind::Modify(_) | EventKind::Create(_) => Some(FileChange::Modified),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

pub struct ConfigWatcher {
    path: PathBuf,
    watcher: RecommendedWatcher,
    watching: bool,
}

impl ConfigWatcher {
    /// Create the watcher without watching anything yet.
    ///
    /// Relevant events are posted as [`Event::ConfigChanged`].
    pub fn new(path: impl Into<PathBuf>, scheduler: Scheduler) -> Result<Self, DaemonError> {
        let watcher = recommended_watcher(move |event: notify::Result<FsEvent>| match event {
            Ok(event) => {
                if let Some(change) = classify(&event.kind) {
                    scheduler.post(Event::ConfigChanged(change));
                }
            }
            Err(err) => tracing::warn!(error = %err, "config watcher event error"),
        })?;
        Ok(Self {
            path: path.into(),
            watcher,
            watching: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }

    /// Drop any existing watch and watch the path afresh.
    ///
    /// Returns `false` if the path cannot be watched (usually because it does
    /// not exist yet); the caller polls.
    pub fn establish(&mut self) -> bool {
        if self.watching {
            // The old inode may already be gone, in which case the backend
            // has dropped the watch itself.
            let _ = self.watcher.unwatch(&self.path);
            self.watching = false;
        }
        match self.watcher.watch(&self.path, RecursiveMode::NonRecursive) {
            Ok(()) => {
                self.watching = true;
                tracing::debug!(path = %self.path.display(), "watching config file");
                true
            }
            Err(err) => {
                tracing::debug!(path = %self.path.display(), error = %err, "config file not watchable yet");
                false
            }
        }
    }
}
