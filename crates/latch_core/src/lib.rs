//! Latch Engine Core
//!
//! Contains the fundamental building blocks shared by every engine crate:
//! - Engine-internal collections (Robin Hood hash map)
//! - Math re-exports

pub mod collections;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
