//! Vertex streams
//!
//! A [`VertexStreamSet`] is one draw group: every vertex in it shares a texture
//! and a vertex-color mode. Its four attribute arrays grow in lock-step, one
//! whole triangle at a time, so they always have equal length and that length
//! is a multiple of three.

use crate::image::{GpuTextureHandle, TextureRef};
use crate::vertex::{VertexColor, VertexNormal, VertexPosition, VertexUv};

/// One corner of a triangle, all attributes together
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamVertex {
    pub position: VertexPosition,
    pub normal: VertexNormal,
    pub uv: VertexUv,
    pub color: VertexColor,
}

/// Four parallel attribute arrays for one texture / color-mode group
#[derive(Debug, Clone, Default)]
pub struct VertexStreamSet {
    texture: Option<TextureRef>,
    gpu_texture: Option<GpuTextureHandle>,
    use_vertex_colors: bool,
    positions: Vec<VertexPosition>,
    normals: Vec<VertexNormal>,
    uvs: Vec<VertexUv>,
    colors: Vec<VertexColor>,
}

impl VertexStreamSet {
    /// Create an empty set for a texture (or none) and color mode
    pub fn new(
        texture: Option<TextureRef>,
        gpu_texture: Option<GpuTextureHandle>,
        use_vertex_colors: bool,
    ) -> Self {
        Self {
            texture,
            gpu_texture,
            use_vertex_colors,
            ..Self::default()
        }
    }

    /// Append one triangle
    pub fn push_triangle(&mut self, corners: [StreamVertex; 3]) {
        for corner in corners {
            self.positions.push(corner.position);
            self.normals.push(corner.normal);
            self.uvs.push(corner.uv);
            self.colors.push(corner.color);
        }
    }

    /// Texture shared by every vertex, `None` when untextured
    pub fn texture(&self) -> Option<&TextureRef> {
        self.texture.as_ref()
    }

    /// GPU handle obtained when the texture was registered
    pub fn gpu_texture(&self) -> Option<GpuTextureHandle> {
        self.gpu_texture
    }

    /// Whether the color array carries meaningful per-vertex colors
    pub fn use_vertex_colors(&self) -> bool {
        self.use_vertex_colors
    }

    pub fn positions(&self) -> &[VertexPosition] {
        &self.positions
    }

    pub fn normals(&self) -> &[VertexNormal] {
        &self.normals
    }

    pub fn uvs(&self) -> &[VertexUv] {
        &self.uvs
    }

    pub fn colors(&self) -> &[VertexColor] {
        &self.colors
    }

    /// Number of vertices (same for every attribute array)
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of whole triangles
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// All attributes of vertex `index`
    pub fn vertex(&self, index: usize) -> Option<StreamVertex> {
        Some(StreamVertex {
            position: *self.positions.get(index)?,
            normal: *self.normals.get(index)?,
            uv: *self.uvs.get(index)?,
            color: *self.colors.get(index)?,
        })
    }

    /// Corners of triangle `index`
    pub fn triangle(&self, index: usize) -> Option<[StreamVertex; 3]> {
        let base = index * 3;
        Some([self.vertex(base)?, self.vertex(base + 1)?, self.vertex(base + 2)?])
    }

    /// Iterate whole triangles in emission order
    pub fn triangles(&self) -> impl Iterator<Item = [StreamVertex; 3]> + '_ {
        (0..self.triangle_count()).filter_map(move |i| self.triangle(i))
    }
}
