//! # Polyview Renderer
//!
//! Frame loop that feeds cached mesh vertex streams to a GPU sink.
//!
//! ## Features
//! - Per-frame texture upload budget
//! - Release of textures no mesh references any more
//! - One draw batch per non-empty vertex stream set
//! - Draw call, triangle and texture statistics

pub mod sink;

pub use sink::{DrawBatch, GpuSink, RecordedBatch, RecordedUpload, RecordingSink};

use std::sync::Arc;

use polyview_assets::GpuTextureRegistry;
use polyview_core::{CoreError, GpuTextureHandle, Mesh, MeshTessellator, RenderStreams, TextureRef};
use thiserror::Error;

/// Renderer errors
#[derive(Error, Debug)]
pub enum RendererError {
    #[error("Tessellation failed: {0}")]
    Tessellation(#[from] CoreError),

    #[error("Texture handle {0} was not issued by this renderer's registry")]
    ForeignTexture(u32),
}

/// Result type for renderer operations
pub type RendererResult<T> = Result<T, RendererError>;

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Maximum texture uploads flushed at the start of each frame
    pub uploads_per_frame: usize,
    /// Do not submit stream sets without triangles
    pub skip_empty_batches: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            uploads_per_frame: 8,
            skip_empty_batches: true,
        }
    }
}

/// Renderer statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Meshes drawn this frame
    pub meshes: u32,
    /// Draw calls this frame
    pub draw_calls: u32,
    /// Triangles rendered
    pub triangles: u32,
    /// Draw calls with a texture bound
    pub textures_bound: u32,
    /// Textures uploaded this frame
    pub uploads: u32,
    /// Textures released at the start of this frame
    pub releases: u32,
}

/// Main renderer instance
pub struct Renderer {
    config: RendererConfig,
    registry: Arc<GpuTextureRegistry>,
    stats: RendererStats,
    frame_number: u64,
}

impl Renderer {
    /// Create a renderer uploading textures registered with `registry`
    pub fn new(config: RendererConfig, registry: Arc<GpuTextureRegistry>) -> Self {
        Self {
            config,
            registry,
            stats: RendererStats::default(),
            frame_number: 0,
        }
    }

    /// Get the renderer configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Get the texture registry
    pub fn registry(&self) -> &Arc<GpuTextureRegistry> {
        &self.registry
    }

    /// Get renderer statistics
    pub fn stats(&self) -> &RendererStats {
        &self.stats
    }

    /// Get the current frame number
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Begin a new frame.
    ///
    /// Textures nothing outside the registry references any more are released
    /// on the sink, then queued uploads are flushed within the frame budget.
    pub fn begin_frame(&mut self, sink: &mut dyn GpuSink) {
        self.frame_number += 1;
        self.stats = RendererStats::default();
        for handle in self.registry.collect_unused() {
            sink.release_texture(handle);
            self.stats.releases += 1;
        }
        let uploads = self.registry.take_pending_uploads(self.config.uploads_per_frame);
        self.upload(sink, uploads);
    }

    /// Submit the vertex streams of `mesh`, rebuilding them if the mesh changed.
    ///
    /// `tessellator` must register textures with [`Renderer::registry`];
    /// streams holding handles from any other registrar are rejected before
    /// anything is drawn. Textures these streams sample that are still queued
    /// are uploaded first, regardless of the per-frame budget. The rest of the
    /// queue waits for [`Renderer::begin_frame`].
    pub fn draw_mesh(
        &mut self,
        mesh: &Mesh,
        tessellator: &MeshTessellator<'_>,
        sink: &mut dyn GpuSink,
    ) -> RendererResult<RenderStreams> {
        let streams = mesh.render_streams(tessellator)?;

        let mut needed: Vec<GpuTextureHandle> = Vec::new();
        for set in streams.iter() {
            let (Some(handle), Some(texture)) = (set.gpu_texture(), set.texture()) else {
                continue;
            };
            let issued = self
                .registry
                .texture(handle)
                .is_some_and(|registered| Arc::ptr_eq(&registered, texture));
            if !issued {
                return Err(RendererError::ForeignTexture(handle.0));
            }
            if !needed.contains(&handle) {
                needed.push(handle);
            }
        }
        let uploads = self.registry.take_pending(&needed);
        self.upload(sink, uploads);

        for set in streams.iter() {
            let batch = DrawBatch::from_stream_set(set);
            if batch.is_empty() && self.config.skip_empty_batches {
                continue;
            }
            sink.draw(&batch);
            self.stats.draw_calls += 1;
            self.stats.triangles += batch.triangle_count() as u32;
            if batch.texture.is_some() {
                self.stats.textures_bound += 1;
            }
        }
        self.stats.meshes += 1;
        Ok(streams)
    }

    /// End the current frame
    pub fn end_frame(&mut self) {
        log::debug!(
            "Frame {}: {} meshes, {} draw calls, {} triangles, {} textures bound, {} uploads ({} pending), {} releases",
            self.frame_number,
            self.stats.meshes,
            self.stats.draw_calls,
            self.stats.triangles,
            self.stats.textures_bound,
            self.stats.uploads,
            self.registry.pending_count(),
            self.stats.releases,
        );
    }

    fn upload(&mut self, sink: &mut dyn GpuSink, uploads: Vec<(GpuTextureHandle, TextureRef)>) {
        for (handle, texture) in uploads {
            sink.upload_texture(handle, &texture);
            self.stats.uploads += 1;
        }
    }
}
