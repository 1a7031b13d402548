//! Background filesystem watcher
//!
//! One OS watcher covers every configured folder. Its events arrive on a
//! channel that a dedicated thread blocks on; each finished file write or
//! move into a watched folder becomes a [`ChangeQueue`] entry. The thread
//! never touches the registry.

use crate::{AssetError, ChangeQueue};
use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const THREAD_NAME: &str = "latch-asset-watcher";

pub struct AssetWatcher {
    /// Owns the channel sender; dropping it ends the watcher thread.
    watcher: Option<RecommendedWatcher>,
    thread: Option<JoinHandle<()>>,
    folders: Vec<PathBuf>,
}

impl AssetWatcher {
    /// Start watching `folders` (non-recursively), feeding `queue`.
    pub fn spawn(folders: &[PathBuf], queue: Arc<ChangeQueue>) -> Result<Self, AssetError> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;

        for folder in folders {
            watcher
                .watch(folder, RecursiveMode::NonRecursive)
                .map_err(|source| AssetError::Watch {
                    path: folder.clone(),
                    source,
                })?;
            tracing::info!("Watching {}", folder.display());
        }

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(rx, queue))
            .map_err(AssetError::WatcherThread)?;

        Ok(Self {
            watcher: Some(watcher),
            thread: Some(thread),
            folders: folders.to_vec(),
        })
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    /// Stop the OS watcher and join the background thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Closing the OS watcher drops the sender, which ends `run`.
        drop(self.watcher.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Asset watcher thread panicked");
            }
        }
    }
}

impl Drop for AssetWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(events: Receiver<notify::Result<Event>>, queue: Arc<ChangeQueue>) {
    tracing::debug!("Asset watcher thread started");

    for result in events {
        match result {
            Ok(event) => {
                for path in changed_files(&event) {
                    if queue.notify(path) {
                        tracing::debug!("Queued change: {}", path.display());
                    }
                }
            }
            Err(err) => tracing::error!("File watcher error: {}", err),
        }
    }

    tracing::debug!("Asset watcher thread stopped");
}

/// Files that `event` reports as completely written or moved into place.
fn changed_files(event: &Event) -> Vec<&Path> {
    let paths: &[PathBuf] = match event.kind {
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => event.paths.as_slice(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths.as_slice(),
        // [from, to]
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.last() {
            Some(to) => std::slice::from_ref(to),
            None => &[],
        },
        // Backends without close-after-write events report writes as data
        // modifications or creations.
        #[cfg(not(target_os = "linux"))]
        EventKind::Create(notify::event::CreateKind::File)
        | EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any) => event.paths.as_slice(),
        _ => &[],
    };

    paths
        .iter()
        .map(PathBuf::as_path)
        .filter(|path| !path.is_dir())
        .collect()
}
