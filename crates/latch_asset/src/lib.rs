//! Latch Asset Pipeline
//!
//! Live asset catalog: files in the watched folders are decoded into
//! per-kind arrays under stable ids, and edits made while the engine runs
//! are picked up by a background watcher and applied in place on the next
//! call to [`AssetRegistry::process_changes`].

pub mod config;
pub mod data;
pub mod decode;
pub mod error;
pub mod handler;
pub mod id;
pub mod queue;
pub mod registry;
pub mod store;
pub mod watcher;

pub use config::CatalogConfig;
pub use data::{AssetData, EntityData, Mesh, Texture};
pub use error::{AssetError, DecodeError};
pub use handler::{AssetHandler, HandlerTable, LoadOutcome};
pub use id::{AssetId, AssetKind, SlotIndex};
pub use queue::ChangeQueue;
pub use registry::{AssetRegistry, DrainReport};
pub use store::AssetStore;
pub use watcher::AssetWatcher;
