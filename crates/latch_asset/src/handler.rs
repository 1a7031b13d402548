//! Extension-keyed decoder dispatch
//!
//! Each asset kind provides an [`AssetHandler`]. Handlers are registered
//! under a lower-case file extension (no leading dot) and are looked up for
//! every path coming out of the initial scan or the change queue.

use crate::data::AssetData;
use crate::store::AssetStore;
use crate::{AssetError, AssetId, AssetKind, DecodeError, SlotIndex};
use latch_core::collections::RobinHoodMap;
use std::fs;
use std::path::Path;

/// What a successful dispatch did to the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// First discovery: a new id and slot were created.
    Registered(AssetId, SlotIndex),
    /// Known asset: content replaced in place.
    Reloaded(AssetId, SlotIndex),
}

impl LoadOutcome {
    pub fn id(&self) -> AssetId {
        match self {
            LoadOutcome::Registered(id, _) | LoadOutcome::Reloaded(id, _) => *id,
        }
    }

    pub fn slot(&self) -> SlotIndex {
        match self {
            LoadOutcome::Registered(_, slot) | LoadOutcome::Reloaded(_, slot) => *slot,
        }
    }
}

/// Decoder for one asset kind.
///
/// Implementors only provide `decode`; `decode_or_reload` takes care of
/// reading the file and choosing between first registration and an in-place
/// reload. A failed decode never reaches the store.
pub trait AssetHandler: Send {
    fn kind(&self) -> AssetKind;

    fn decode(&self, path: &Path, bytes: &[u8]) -> Result<AssetData, DecodeError>;

    fn decode_or_reload(
        &self,
        path: &Path,
        store: &mut AssetStore,
    ) -> Result<LoadOutcome, AssetError> {
        let name = asset_name(path)?;
        let bytes = fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let decoded = if bytes.is_empty() {
            Err(DecodeError::Empty)
        } else {
            self.decode(path, &bytes)
        };
        let data = decoded.map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        if data.kind() != self.kind() {
            return Err(AssetError::HandlerKind {
                path: path.to_path_buf(),
                expected: self.kind(),
                produced: data.kind(),
            });
        }

        match store.id_of(name) {
            Some(id) => store
                .update_existing(id, data)
                .map(|slot| LoadOutcome::Reloaded(id, slot)),
            None => store
                .register_new(name, data)
                .map(|(id, slot)| LoadOutcome::Registered(id, slot)),
        }
    }
}

/// Name under which a file is registered: its file name, extension included.
pub fn asset_name(path: &Path) -> Result<&str, AssetError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AssetError::InvalidPath {
            path: path.to_path_buf(),
        })
}

/// Lower-case extension of `path` without the dot, used as dispatch key.
pub fn dispatch_key(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

pub struct HandlerTable {
    handlers: RobinHoodMap<String, Box<dyn AssetHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self {
            handlers: RobinHoodMap::with_capacity(16),
        }
    }

    /// Register `handler` for `extension`. A later registration for the same
    /// extension replaces the earlier one.
    pub fn register(&mut self, extension: &str, handler: Box<dyn AssetHandler>) {
        let key = extension.trim_start_matches('.').to_ascii_lowercase();

        if let Some(existing) = self.handlers.get_mut(key.as_str()) {
            tracing::warn!(
                "Handler for '.{}' ({}) replaced by a {} handler",
                key,
                existing.kind(),
                handler.kind()
            );
            *existing = handler;
            return;
        }

        tracing::debug!("Registered {} handler for '.{}'", handler.kind(), key);
        if let Err(err) = self.handlers.add(key, handler) {
            tracing::error!("Failed to register handler: {}", err);
        }
    }

    pub fn get(&self, extension: &str) -> Option<&dyn AssetHandler> {
        self.handlers.get(extension).map(|handler| &**handler)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Route `path` to the handler registered for its extension.
    pub fn dispatch(&self, path: &Path, store: &mut AssetStore) -> Result<LoadOutcome, AssetError> {
        let extension = dispatch_key(path).unwrap_or_default();
        match self.get(&extension) {
            Some(handler) => handler.decode_or_reload(path, store),
            None => Err(AssetError::UnknownExtension {
                extension,
                path: path.to_path_buf(),
            }),
        }
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new()
    }
}
