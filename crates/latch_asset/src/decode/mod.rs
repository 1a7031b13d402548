//! Built-in decoders

mod entity;
mod obj;
mod texture;

pub use entity::{parse_entity, EntityHandler};
pub use obj::{parse_obj, ObjHandler};
pub use texture::TextureHandler;

use crate::AssetRegistry;

/// Register the handlers shipped with the engine.
pub fn register_defaults(registry: &mut AssetRegistry) {
    registry.register_handler("bmp", TextureHandler::bmp());
    registry.register_handler("png", TextureHandler::png());
    registry.register_handler("obj", ObjHandler);
    registry.register_handler("ent", EntityHandler);
}
