//! Identity-stable asset storage
//!
//! `AssetStore` owns the name -> id index, one id -> slot index per kind and
//! the dense per-kind content arrays. Ids and slots are created together on
//! first registration and never change afterwards; reloading only replaces
//! the content at an existing slot.

use crate::data::{AssetData, EntityData, Mesh, Texture};
use crate::{AssetError, AssetId, AssetKind, SlotIndex};
use latch_core::collections::RobinHoodMap;

pub struct AssetStore {
    next_id: u32,
    names: RobinHoodMap<String, AssetId>,
    texture_slots: RobinHoodMap<AssetId, SlotIndex>,
    mesh_slots: RobinHoodMap<AssetId, SlotIndex>,
    entity_slots: RobinHoodMap<AssetId, SlotIndex>,
    textures: Vec<Texture>,
    meshes: Vec<Mesh>,
    entities: Vec<EntityData>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            names: RobinHoodMap::new(),
            texture_slots: RobinHoodMap::new(),
            mesh_slots: RobinHoodMap::new(),
            entity_slots: RobinHoodMap::new(),
            textures: Vec::new(),
            meshes: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Register a never-seen asset, appending its content to the array of
    /// its kind.
    pub fn register_new(
        &mut self,
        name: &str,
        data: AssetData,
    ) -> Result<(AssetId, SlotIndex), AssetError> {
        if self.names.contains_key(name) {
            return Err(AssetError::DuplicateName {
                name: name.to_string(),
            });
        }
        if self.next_id == AssetId::INVALID.raw() {
            return Err(AssetError::IdSpaceExhausted);
        }

        let id = AssetId::new(self.next_id);
        let kind = data.kind();
        let slot = match data {
            AssetData::Texture(texture) => push_slot(&mut self.textures, texture),
            AssetData::Mesh(mesh) => push_slot(&mut self.meshes, mesh),
            AssetData::Entity(entity) => push_slot(&mut self.entities, entity),
        };

        self.names.add(name.to_string(), id)?;
        self.slots_mut(kind).add(id, slot)?;
        self.next_id += 1;

        tracing::info!("Registered {} '{}' as {} (slot {})", kind, name, id, slot.raw());
        Ok((id, slot))
    }

    /// Replace the content bound to `id` in place. No index is touched, so
    /// holders of the id or slot observe the new content transparently.
    pub fn update_existing(&mut self, id: AssetId, data: AssetData) -> Result<SlotIndex, AssetError> {
        let kind = data.kind();
        let slot = match self.slots(kind).get(&id) {
            Some(slot) => *slot,
            None => {
                return Err(match self.kind_of(id) {
                    Some(existing) => AssetError::KindMismatch {
                        id,
                        existing,
                        requested: kind,
                    },
                    None => AssetError::UnknownAsset { id, kind },
                });
            }
        };

        match data {
            AssetData::Texture(texture) => self.textures[slot.index()] = texture,
            AssetData::Mesh(mesh) => self.meshes[slot.index()] = mesh,
            AssetData::Entity(entity) => self.entities[slot.index()] = entity,
        }

        tracing::info!("Reloaded {} {} (slot {})", kind, id, slot.raw());
        Ok(slot)
    }

    /// Look up an asset by name, logging a warning on a miss.
    pub fn find_id_by_name(&self, name: &str) -> Option<AssetId> {
        let id = self.id_of(name);
        if id.is_none() {
            tracing::warn!("Unknown asset name: {}", name);
        }
        id
    }

    /// Look up the slot bound to `id` for `kind`, logging a warning on a miss.
    pub fn find_slot_by_id(&self, id: AssetId, kind: AssetKind) -> Option<SlotIndex> {
        let slot = self.slots(kind).get(&id).copied();
        if slot.is_none() {
            tracing::warn!("No {} slot for asset {}", kind, id);
        }
        slot
    }

    /// Silent name lookup for callers that expect misses (first discovery).
    pub fn id_of(&self, name: &str) -> Option<AssetId> {
        self.names.get(name).copied()
    }

    pub fn kind_of(&self, id: AssetId) -> Option<AssetKind> {
        AssetKind::ALL
            .into_iter()
            .find(|kind| self.slots(*kind).contains_key(&id))
    }

    pub fn texture(&self, slot: SlotIndex) -> Option<&Texture> {
        self.textures.get(slot.index())
    }

    pub fn mesh(&self, slot: SlotIndex) -> Option<&Mesh> {
        self.meshes.get(slot.index())
    }

    pub fn entity(&self, slot: SlotIndex) -> Option<&EntityData> {
        self.entities.get(slot.index())
    }

    /// Total number of registered assets across all kinds.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn count(&self, kind: AssetKind) -> usize {
        match kind {
            AssetKind::Texture => self.textures.len(),
            AssetKind::Mesh => self.meshes.len(),
            AssetKind::Entity => self.entities.len(),
        }
    }

    fn slots(&self, kind: AssetKind) -> &RobinHoodMap<AssetId, SlotIndex> {
        match kind {
            AssetKind::Texture => &self.texture_slots,
            AssetKind::Mesh => &self.mesh_slots,
            AssetKind::Entity => &self.entity_slots,
        }
    }

    fn slots_mut(&mut self, kind: AssetKind) -> &mut RobinHoodMap<AssetId, SlotIndex> {
        match kind {
            AssetKind::Texture => &mut self.texture_slots,
            AssetKind::Mesh => &mut self.mesh_slots,
            AssetKind::Entity => &mut self.entity_slots,
        }
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

fn push_slot<T>(items: &mut Vec<T>, item: T) -> SlotIndex {
    let slot = SlotIndex::new(items.len() as u32);
    items.push(item);
    slot
}
