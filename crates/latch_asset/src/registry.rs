//! Asset registry: cold-start scan, change dispatch and lookups
//!
//! The registry is created once by the engine root and lives on the thread
//! that runs the tick loop. Only its [`ChangeQueue`] is shared with the
//! watcher thread; everything else is touched from the owning thread.
//!
//! ```ignore
//! let mut registry = AssetRegistry::with_default_handlers(&config);
//! registry.start_watching()?;
//! registry.scan_folders();
//! loop {
//!     registry.process_changes();
//!     // ... rest of the tick ...
//! }
//! ```

use crate::data::AssetData;
use crate::decode;
use crate::handler::{AssetHandler, HandlerTable, LoadOutcome};
use crate::store::AssetStore;
use crate::watcher::AssetWatcher;
use crate::{AssetError, AssetId, AssetKind, CatalogConfig, ChangeQueue, SlotIndex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-drain summary, mostly for logging.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub registered: usize,
    pub reloaded: usize,
    pub failed: usize,
    pub unhandled: usize,
}

impl DrainReport {
    pub fn total(&self) -> usize {
        self.registered + self.reloaded + self.failed + self.unhandled
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn record(&mut self, result: &Result<LoadOutcome, AssetError>) {
        match result {
            Ok(LoadOutcome::Registered(..)) => self.registered += 1,
            Ok(LoadOutcome::Reloaded(..)) => self.reloaded += 1,
            Err(AssetError::UnknownExtension { .. }) => self.unhandled += 1,
            Err(_) => self.failed += 1,
        }
    }
}

pub struct AssetRegistry {
    store: AssetStore,
    handlers: HandlerTable,
    folders: Vec<PathBuf>,
    queue: Arc<ChangeQueue>,
    watcher: Option<AssetWatcher>,
}

impl AssetRegistry {
    /// Create an empty registry without handlers.
    ///
    /// Configured folders are resolved to absolute paths so they match the
    /// paths reported by the watcher. Folders that do not exist are skipped.
    pub fn new(config: &CatalogConfig) -> Self {
        let folders = config
            .watch_folders
            .iter()
            .filter_map(|folder| match fs::canonicalize(folder) {
                Ok(resolved) => Some(resolved),
                Err(err) => {
                    tracing::warn!("Skipping asset folder {}: {}", folder.display(), err);
                    None
                }
            })
            .collect();

        Self {
            store: AssetStore::new(),
            handlers: HandlerTable::new(),
            folders,
            queue: Arc::new(ChangeQueue::new()),
            watcher: None,
        }
    }

    /// Create a registry with the built-in texture, mesh and entity handlers.
    pub fn with_default_handlers(config: &CatalogConfig) -> Self {
        let mut registry = Self::new(config);
        decode::register_defaults(&mut registry);
        registry
    }

    pub fn register_handler(&mut self, extension: &str, handler: impl AssetHandler + 'static) {
        self.handlers.register(extension, Box::new(handler));
    }

    pub fn register_new(
        &mut self,
        name: &str,
        data: AssetData,
    ) -> Result<(AssetId, SlotIndex), AssetError> {
        self.store.register_new(name, data)
    }

    pub fn update_existing(&mut self, id: AssetId, data: AssetData) -> Result<SlotIndex, AssetError> {
        self.store.update_existing(id, data)
    }

    pub fn find_id_by_name(&self, name: &str) -> Option<AssetId> {
        self.store.find_id_by_name(name)
    }

    pub fn find_slot_by_id(&self, id: AssetId, kind: AssetKind) -> Option<SlotIndex> {
        self.store.find_slot_by_id(id, kind)
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    /// Resolved watch folders, in configuration order.
    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    /// Shared handle for producers of change notifications.
    pub fn queue(&self) -> Arc<ChangeQueue> {
        Arc::clone(&self.queue)
    }

    /// Queue a path for the next drain.
    pub fn notify(&self, path: &Path) -> bool {
        self.queue.notify(path)
    }

    /// Feed every file in every watched folder through the dispatch path.
    ///
    /// Files are visited in path order per folder so ids are assigned
    /// deterministically.
    pub fn scan_folders(&mut self) -> DrainReport {
        let mut report = DrainReport::default();

        for folder in self.folders.clone() {
            let mut files = match list_files(&folder) {
                Ok(files) => files,
                Err(err) => {
                    tracing::error!("Failed to list {}: {}", folder.display(), err);
                    continue;
                }
            };
            files.sort();

            tracing::info!("Scanning {} ({} files)", folder.display(), files.len());
            for path in files {
                let result = self.dispatch(&path);
                report.record(&result);
            }
        }

        tracing::info!(
            "Initial scan: {} registered, {} failed, {} unhandled",
            report.registered,
            report.failed,
            report.unhandled
        );
        report
    }

    /// Start the background watcher over the resolved folders.
    ///
    /// Call before [`scan_folders`](Self::scan_folders): a file written
    /// while the scan runs is then queued and picked up by the next drain
    /// as a reload instead of being missed.
    pub fn start_watching(&mut self) -> Result<(), AssetError> {
        if self.watcher.is_some() {
            return Ok(());
        }
        self.watcher = Some(AssetWatcher::spawn(&self.folders, self.queue())?);
        Ok(())
    }

    pub fn stop_watching(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.shutdown();
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Drain the change queue and dispatch every pending path.
    ///
    /// Called once per tick from the owning thread. Handlers run after the
    /// queue lock is released, so the watcher keeps queueing while a slow
    /// decode is in progress. A failure for one path does not stop the rest.
    pub fn process_changes(&mut self) -> DrainReport {
        let pending = self.queue.drain();
        let mut report = DrainReport::default();
        if pending.is_empty() {
            return report;
        }

        for path in &pending {
            let result = self.dispatch(path);
            report.record(&result);
        }

        tracing::debug!(
            "Processed {} changes: {} registered, {} reloaded, {} failed, {} unhandled",
            pending.len(),
            report.registered,
            report.reloaded,
            report.failed,
            report.unhandled
        );
        report
    }

    fn dispatch(&mut self, path: &Path) -> Result<LoadOutcome, AssetError> {
        let result = self.handlers.dispatch(path, &mut self.store);
        match &result {
            Ok(_) => {}
            Err(err @ AssetError::UnknownExtension { .. }) => tracing::warn!("{}", err),
            Err(err @ (AssetError::Decode { .. } | AssetError::Io { .. })) => {
                tracing::warn!("Skipping asset: {}", err)
            }
            Err(err) => tracing::error!("Failed to load {}: {}", path.display(), err),
        }
        result
    }
}

fn list_files(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Texture;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    const CUBE_OBJ: &str = "\
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
f 1 2 3
f 1 3 4
";

    const PLAYER_ENT: &str = "#version 1\nposition 1, 2, 3;\nmesh cube.obj;\n";

    fn write_bmp(path: &Path, width: u32, height: u32, rgb: [u8; 3]) {
        let image = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        image.save_with_format(path, image::ImageFormat::Bmp).unwrap();
    }

    fn registry_for(dir: &TempDir) -> AssetRegistry {
        AssetRegistry::with_default_handlers(&CatalogConfig::with_folders([dir.path()]))
    }

    fn tiny_texture() -> AssetData {
        AssetData::Texture(Texture {
            width: 1,
            height: 1,
            pixels: vec![0, 0, 0, 255],
        })
    }

    #[test]
    fn test_cold_start_registers_each_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cube.obj"), CUBE_OBJ).unwrap();
        write_bmp(&dir.path().join("player.bmp"), 2, 2, [255, 0, 0]);

        let mut registry = registry_for(&dir);
        let report = registry.scan_folders();

        assert_eq!(report.registered, 2);
        assert_eq!(registry.store().len(), 2);

        let cube = registry.find_id_by_name("cube.obj").unwrap();
        let player = registry.find_id_by_name("player.bmp").unwrap();
        assert_ne!(cube, player);
        assert!(registry.find_slot_by_id(cube, AssetKind::Mesh).is_some());
        assert!(registry.find_slot_by_id(player, AssetKind::Texture).is_some());
    }

    #[test]
    fn test_scan_assigns_ids_in_path_order() {
        let dir = TempDir::new().unwrap();
        write_bmp(&dir.path().join("b.bmp"), 1, 1, [0, 0, 0]);
        write_bmp(&dir.path().join("a.bmp"), 1, 1, [0, 0, 0]);

        let mut registry = registry_for(&dir);
        registry.scan_folders();

        assert_eq!(registry.find_id_by_name("a.bmp").unwrap().raw(), 0);
        assert_eq!(registry.find_id_by_name("b.bmp").unwrap().raw(), 1);
    }

    #[test]
    fn test_scan_skips_bad_files_and_continues() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.obj"), "f 1 2 3\n").unwrap();
        fs::write(dir.path().join("empty.ent"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join("player.ent"), PLAYER_ENT).unwrap();

        let mut registry = registry_for(&dir);
        let report = registry.scan_folders();

        assert_eq!(
            report,
            DrainReport {
                registered: 1,
                reloaded: 0,
                failed: 2,
                unhandled: 1,
            }
        );
        assert!(registry.store().id_of("player.ent").is_some());
        assert!(registry.store().id_of("broken.obj").is_none());
    }

    #[test]
    fn test_reload_through_queue_keeps_identity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("player.bmp");
        write_bmp(&path, 2, 2, [10, 20, 30]);

        let mut registry = registry_for(&dir);
        registry.scan_folders();
        let id0 = registry.find_id_by_name("player.bmp").unwrap();
        let slot0 = registry.find_slot_by_id(id0, AssetKind::Texture).unwrap();

        write_bmp(&path, 4, 1, [1, 2, 3]);
        let resolved = fs::canonicalize(&path).unwrap();
        registry.notify(&resolved);
        let report = registry.process_changes();

        assert_eq!(report.reloaded, 1);
        assert_eq!(registry.find_id_by_name("player.bmp"), Some(id0));
        assert_eq!(registry.find_slot_by_id(id0, AssetKind::Texture), Some(slot0));
        let texture = registry.store().texture(slot0).unwrap();
        assert_eq!((texture.width, texture.height), (4, 1));
        assert_eq!(&texture.pixels[..4], &[1, 2, 3, 255]);
    }

    #[test]
    fn test_duplicate_notify_invokes_handler_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.bmp");
        write_bmp(&path, 1, 1, [5, 5, 5]);

        let mut registry = registry_for(&dir);
        assert!(registry.notify(&path));
        assert!(!registry.notify(&path));
        assert_eq!(registry.queue().len(), 1);

        let report = registry.process_changes();
        assert_eq!(report.total(), 1);
        assert_eq!(report.registered, 1);
    }

    #[test]
    fn test_unknown_extension_is_dropped() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry_for(&dir);

        registry.notify(Path::new("/assets/foo.xyz"));
        let report = registry.process_changes();

        assert_eq!(report.unhandled, 1);
        assert!(registry.queue().is_empty());
        assert!(registry.store().is_empty());
    }

    #[test]
    fn test_empty_drain_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry_for(&dir);
        assert!(registry.process_changes().is_empty());
    }

    #[test]
    fn test_missing_folders_are_skipped() {
        let dir = TempDir::new().unwrap();
        let config = CatalogConfig::with_folders([dir.path().to_path_buf(), PathBuf::from("/no/such/folder")]);

        let registry = AssetRegistry::new(&config);
        assert_eq!(registry.folders(), &[fs::canonicalize(dir.path()).unwrap()]);
    }

    #[test]
    fn test_direct_registration_and_lookup() {
        let dir = TempDir::new().unwrap();
        let mut registry = AssetRegistry::new(&CatalogConfig::with_folders([dir.path()]));

        let (id, slot) = registry.register_new("ui.bmp", tiny_texture()).unwrap();
        registry.update_existing(id, tiny_texture()).unwrap();

        assert_eq!(registry.find_id_by_name("ui.bmp"), Some(id));
        assert_eq!(registry.find_slot_by_id(id, AssetKind::Texture), Some(slot));
        assert!(registry.register_new("ui.bmp", tiny_texture()).is_err());
    }

    #[test]
    fn test_write_during_scan_is_reloaded_not_duplicated() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry_for(&dir);
        registry.start_watching().unwrap();

        let folder = registry.folders()[0].clone();
        let path = folder.join("crate.ent");
        fs::write(&path, PLAYER_ENT).unwrap();

        let report = registry.scan_folders();
        assert_eq!(report.registered, 1);
        let id = registry.find_id_by_name("crate.ent").unwrap();
        let slot = registry.find_slot_by_id(id, AssetKind::Entity).unwrap();

        // the same write also arrives through the watcher
        let deadline = Instant::now() + Duration::from_secs(5);
        while registry.queue().is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        let report = registry.process_changes();

        assert_eq!(report.registered, 0);
        assert_eq!(report.reloaded, 1);
        assert_eq!(registry.store().len(), 1);
        assert_eq!(registry.find_id_by_name("crate.ent"), Some(id));
        assert_eq!(registry.find_slot_by_id(id, AssetKind::Entity), Some(slot));

        registry.stop_watching();
    }

    #[test]
    fn test_watched_write_reaches_the_store() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry_for(&dir);
        registry.scan_folders();
        registry.start_watching().unwrap();
        assert!(registry.is_watching());

        let folder = registry.folders()[0].clone();
        fs::write(folder.join("door.ent"), PLAYER_ENT).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while registry.store().id_of("door.ent").is_none() && Instant::now() < deadline {
            registry.process_changes();
            std::thread::sleep(Duration::from_millis(20));
        }

        let id = registry.store().id_of("door.ent").expect("watched file was not loaded");
        let slot = registry.find_slot_by_id(id, AssetKind::Entity).unwrap();
        assert_eq!(registry.store().entity(slot).unwrap().mesh.as_deref(), Some("cube.obj"));

        registry.stop_watching();
        assert!(!registry.is_watching());
    }
}
