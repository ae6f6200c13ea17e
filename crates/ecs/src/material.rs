use crate::EcsError;
use serde::{Deserialize, Serialize};
use spacekit_common::MaterialId;
use std::fmt;

/// Texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// Tightly packed RGBA8 pixels, row-major, top row first.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, EcsError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(EcsError::BitmapSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-color bitmap.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: rgba.repeat(count),
        }
    }

    /// Square checkerboard with `cells` cells per side.
    pub fn checkerboard(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = (size / cells.max(1)).max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.extend_from_slice(if even { &a } else { &b });
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Construction parameters for a [`Material`].
#[derive(Debug, Clone)]
pub struct MaterialConfig {
    pub texture: Bitmap,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
}

impl MaterialConfig {
    /// Linear min/mag filtering, the loader default.
    pub fn linear(texture: Bitmap) -> Self {
        Self {
            texture,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
        }
    }
}

/// Texture plus sampler settings. Immutable after construction, which is what
/// lets the renderer upload its texture exactly once.
#[derive(Debug)]
pub struct Material {
    id: MaterialId,
    texture: Bitmap,
    min_filter: FilterMode,
    mag_filter: FilterMode,
}

impl Material {
    pub(crate) fn new(id: MaterialId, config: MaterialConfig) -> Self {
        Self {
            id,
            texture: config.texture,
            min_filter: config.min_filter,
            mag_filter: config.mag_filter,
        }
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    pub fn texture(&self) -> &Bitmap {
        &self.texture
    }

    /// Pixel dimensions `[width, height]` of the texture.
    pub fn texture_size(&self) -> [u32; 2] {
        [self.texture.width, self.texture.height]
    }

    pub fn min_filter(&self) -> FilterMode {
        self.min_filter
    }

    pub fn mag_filter(&self) -> FilterMode {
        self.mag_filter
    }
}
