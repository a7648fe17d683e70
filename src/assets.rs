use crate::error::LanderError;

const MAGENTA: [u8; 4] = [255, 0, 255, 255];

/// Decoded RGBA8 pixels, row-major from the top left.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    /// 1x1 texture of a single colour.
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: color.to_vec(),
        }
    }

    pub fn white_pixel() -> Self {
        Self::solid([255; 4])
    }

    /// Stand-in for a texture that failed to load.
    pub fn placeholder() -> Self {
        Self::solid(MAGENTA)
    }

    /// Load and decode an image file. The format is sniffed from the bytes,
    /// not the extension.
    pub fn from_file(path: &str) -> Result<Self, LanderError> {
        let bytes = std::fs::read(path).map_err(|source| LanderError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_bytes(&bytes, path)
    }

    /// Decode an in-memory encoded image. `name` is only used in errors.
    pub fn from_bytes(bytes: &[u8], name: &str) -> Result<Self, LanderError> {
        let img = image::load_from_memory(bytes).map_err(|source| LanderError::Image {
            path: name.to_string(),
            source,
        })?;
        let rgba = img.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }
}

/// Load a texture, falling back to a magenta placeholder with a warning.
/// Nothing downstream validates texture handles, so a missing file only
/// shows up on screen.
pub fn load_texture(path: &str) -> TextureData {
    match TextureData::from_file(path) {
        Ok(texture) => {
            log::debug!("loaded {} ({}x{})", path, texture.width, texture.height);
            texture
        }
        Err(e) => {
            log::warn!("{}, using placeholder", e);
            TextureData::placeholder()
        }
    }
}
