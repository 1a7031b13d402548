//! Decoded, kind-specific asset content
//!
//! These are the values stored in the registry's dense slot arrays. A
//! reload swaps the value at a slot; the slot itself never moves.

use crate::AssetKind;
use glam::{Quat, Vec2, Vec3};

/// RGBA8 pixels, rows top-down.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Texture {
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }
}

/// Indexed triangle list. `normals` and `uvs` are either empty or have one
/// entry per position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Placement of an entity plus the names of the assets it references.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityData {
    pub position: Vec3,
    pub scale: Vec3,
    pub rotation: Quat,
    pub mesh: Option<String>,
    pub textures: Vec<String>,
}

impl Default for EntityData {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Quat::IDENTITY,
            mesh: None,
            textures: Vec::new(),
        }
    }
}

/// Output of a decoder, tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetData {
    Texture(Texture),
    Mesh(Mesh),
    Entity(EntityData),
}

impl AssetData {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetData::Texture(_) => AssetKind::Texture,
            AssetData::Mesh(_) => AssetKind::Mesh,
            AssetData::Entity(_) => AssetKind::Entity,
        }
    }
}

impl From<Texture> for AssetData {
    fn from(texture: Texture) -> Self {
        AssetData::Texture(texture)
    }
}

impl From<Mesh> for AssetData {
    fn from(mesh: Mesh) -> Self {
        AssetData::Mesh(mesh)
    }
}

impl From<EntityData> for AssetData {
    fn from(entity: EntityData) -> Self {
        AssetData::Entity(entity)
    }
}
