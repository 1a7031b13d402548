//! Stable asset handles
//!
//! Both handle types are plain integers so other subsystems can store them
//! in GPU-side descriptors or save files. Neither is ever reused or moved
//! while the registry is alive.

use std::fmt;

/// Process-wide asset identity, assigned once at first discovery.
///
/// `AssetId::INVALID` is the "not found" value for callers that keep raw
/// handles; registry lookups themselves return `Option<AssetId>`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(u32);

impl AssetId {
    pub const INVALID: AssetId = AssetId(u32::MAX);

    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#invalid")
        }
    }
}

/// Position of an asset's content inside its kind's dense array.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotIndex(u32);

impl SlotIndex {
    pub const INVALID: SlotIndex = SlotIndex(u32::MAX);

    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

/// Storage class of an asset. Each kind has its own slot array.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Texture,
    Mesh,
    Entity,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Texture, AssetKind::Mesh, AssetKind::Entity];

    pub fn name(&self) -> &'static str {
        match self {
            AssetKind::Texture => "texture",
            AssetKind::Mesh => "mesh",
            AssetKind::Entity => "entity",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
