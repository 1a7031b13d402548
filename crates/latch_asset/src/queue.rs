//! Coalescing hand-off between the watcher thread and the tick thread
//!
//! The queue is the only state shared between the two. It holds at most one
//! pending entry per path between drains: a burst of events for one file
//! collapses into a single reload.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct ChangeQueue {
    pending: Mutex<Vec<PathBuf>>,
}

impl ChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `path` unless it is already pending. Returns `false` when the
    /// notification was coalesced into an existing entry.
    pub fn notify(&self, path: &Path) -> bool {
        let mut pending = self.pending.lock();
        if pending.iter().any(|queued| queued == path) {
            tracing::debug!("Coalesced change for {}", path.display());
            return false;
        }
        pending.push(path.to_path_buf());
        true
    }

    /// Take every pending path, leaving the queue empty.
    ///
    /// The lock is released before returning so callers can process the
    /// paths without blocking producers.
    pub fn drain(&self) -> Vec<PathBuf> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
