//! GPU sink
//!
//! The boundary where vertex streams leave Polyview. A sink binds textures and
//! issues draw calls; [`RecordingSink`] keeps what it was given instead.

use polyview_core::{
    GpuTextureHandle, ImageBuffer, VertexColor, VertexNormal, VertexPosition, VertexStreamSet,
    VertexUv,
};

/// One draw call worth of vertex data, borrowed from a [`VertexStreamSet`]
#[derive(Debug, Clone, Copy)]
pub struct DrawBatch<'a> {
    pub positions: &'a [VertexPosition],
    pub normals: &'a [VertexNormal],
    pub uvs: &'a [VertexUv],
    pub colors: &'a [VertexColor],
    /// Texture to bind, `None` for untextured geometry
    pub texture: Option<GpuTextureHandle>,
    /// Whether `colors` should be used by the shader
    pub use_vertex_colors: bool,
}

impl<'a> DrawBatch<'a> {
    /// Borrow the arrays of a stream set
    pub fn from_stream_set(set: &'a VertexStreamSet) -> Self {
        Self {
            positions: set.positions(),
            normals: set.normals(),
            uvs: set.uvs(),
            colors: set.colors(),
            texture: set.gpu_texture(),
            use_vertex_colors: set.use_vertex_colors(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Raw bytes of each attribute array, in position/normal/uv/color order
    pub fn attribute_bytes(&self) -> [&'a [u8]; 4] {
        [
            bytemuck::cast_slice(self.positions),
            bytemuck::cast_slice(self.normals),
            bytemuck::cast_slice(self.uvs),
            bytemuck::cast_slice(self.colors),
        ]
    }

    /// Total size of the vertex data in bytes
    pub fn byte_len(&self) -> usize {
        self.attribute_bytes().iter().map(|bytes| bytes.len()).sum()
    }
}

/// Consumer of texture uploads and draw batches
pub trait GpuSink {
    /// Upload pixel data for a registered texture
    fn upload_texture(&mut self, handle: GpuTextureHandle, image: &ImageBuffer);

    /// Issue one draw call
    fn draw(&mut self, batch: &DrawBatch<'_>);

    /// Free the GPU copy of a texture the registry released
    fn release_texture(&mut self, _handle: GpuTextureHandle) {}
}

/// A texture upload seen by a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpload {
    pub handle: GpuTextureHandle,
    pub width: u32,
    pub height: u32,
}

/// Owned copy of a [`DrawBatch`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBatch {
    pub positions: Vec<VertexPosition>,
    pub normals: Vec<VertexNormal>,
    pub uvs: Vec<VertexUv>,
    pub colors: Vec<VertexColor>,
    pub texture: Option<GpuTextureHandle>,
    pub use_vertex_colors: bool,
}

impl RecordedBatch {
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }
}

impl From<&DrawBatch<'_>> for RecordedBatch {
    fn from(batch: &DrawBatch<'_>) -> Self {
        Self {
            positions: batch.positions.to_vec(),
            normals: batch.normals.to_vec(),
            uvs: batch.uvs.to_vec(),
            colors: batch.colors.to_vec(),
            texture: batch.texture,
            use_vertex_colors: batch.use_vertex_colors,
        }
    }
}

/// Sink that records everything it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    uploads: Vec<RecordedUpload>,
    batches: Vec<RecordedBatch>,
    releases: Vec<GpuTextureHandle>,
    bytes_submitted: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploads(&self) -> &[RecordedUpload] {
        &self.uploads
    }

    pub fn batches(&self) -> &[RecordedBatch] {
        &self.batches
    }

    pub fn releases(&self) -> &[GpuTextureHandle] {
        &self.releases
    }

    /// Vertex bytes received across all batches
    pub fn bytes_submitted(&self) -> usize {
        self.bytes_submitted
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.uploads.clear();
        self.batches.clear();
        self.releases.clear();
        self.bytes_submitted = 0;
    }
}

impl GpuSink for RecordingSink {
    fn upload_texture(&mut self, handle: GpuTextureHandle, image: &ImageBuffer) {
        self.uploads.push(RecordedUpload {
            handle,
            width: image.width(),
            height: image.height(),
        });
    }

    fn draw(&mut self, batch: &DrawBatch<'_>) {
        self.bytes_submitted += batch.byte_len();
        self.batches.push(RecordedBatch::from(batch));
    }

    fn release_texture(&mut self, handle: GpuTextureHandle) {
        self.releases.push(handle);
    }
}
