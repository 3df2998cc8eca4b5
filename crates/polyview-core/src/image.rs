//! Images and GPU texture registration
//!
//! Faces reference textures through [`TextureRef`], a shared handle whose
//! *identity* (not pixel content) decides draw grouping. Uploading is the job of
//! a [`TextureRegistrar`], which hands back an opaque [`GpuTextureHandle`].

use std::sync::Arc;

use crate::{CoreError, CoreResult};

/// Bytes per RGBA8 texel
pub const BYTES_PER_PIXEL: usize = 4;

/// Decoded RGBA8 image, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageBuffer {
    /// Create a transparent black image
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    /// Create an image filled with one color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * BYTES_PER_PIXEL);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self { width, height, pixels }
    }

    /// Wrap existing RGBA8 pixel data
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> CoreResult<Self> {
        if pixels.len() != width as usize * height as usize * BYTES_PER_PIXEL {
            return Err(CoreError::InvalidImage {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Image width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The pixel at `(x, y)`, if in range
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.pixels[offset..offset + BYTES_PER_PIXEL]);
        Some(rgba)
    }
}

/// Shared texture handle attached to mesh faces
pub type TextureRef = Arc<ImageBuffer>;

/// Identity comparison of optional textures.
///
/// Two faces share a draw group only when they point at the very same image
/// allocation; equal pixel data in different allocations does not count.
pub fn same_texture(a: Option<&TextureRef>, b: Option<&TextureRef>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

/// Opaque handle to a texture registered for GPU upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuTextureHandle(pub u32);

/// Registers textures for upload to the GPU.
///
/// Registration must be idempotent: registering the same texture again returns
/// the same handle and has no further side effects. Implementations must not
/// block on the upload itself.
pub trait TextureRegistrar: Send + Sync {
    /// Register a texture, returning its GPU handle
    fn register(&self, texture: &TextureRef) -> GpuTextureHandle;
}
