//! Bitmap textures (`.bmp`, `.png`)

use crate::data::{AssetData, Texture};
use crate::handler::AssetHandler;
use crate::{AssetKind, DecodeError};
use image::ImageFormat;
use std::path::Path;

/// Decodes bitmap images into RGBA8 textures.
pub struct TextureHandler {
    format: ImageFormat,
}

impl TextureHandler {
    pub fn new(format: ImageFormat) -> Self {
        Self { format }
    }

    pub fn bmp() -> Self {
        Self::new(ImageFormat::Bmp)
    }

    pub fn png() -> Self {
        Self::new(ImageFormat::Png)
    }
}

impl AssetHandler for TextureHandler {
    fn kind(&self) -> AssetKind {
        AssetKind::Texture
    }

    fn decode(&self, path: &Path, bytes: &[u8]) -> Result<AssetData, DecodeError> {
        let rgba = image::load_from_memory_with_format(bytes, self.format)?.to_rgba8();
        tracing::debug!(
            "Decoded {:?} {}: {}x{}",
            self.format,
            path.display(),
            rgba.width(),
            rgba.height()
        );

        Ok(AssetData::Texture(Texture {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        }))
    }
}
