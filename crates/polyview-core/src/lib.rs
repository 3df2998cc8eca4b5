//! # Polyview Core
//!
//! Mesh-to-GPU translation and transform-aware bounds caching for the Polyview
//! mesh viewer.
//!
//! This crate provides:
//! - **Mesh**: Polygon mesh with per-face textures, a stored convex hull and a
//!   change counter
//! - **Bounds**: Per-mesh AABB cache keyed by the last transform
//! - **Tessellation**: Fan triangulation into texture-grouped vertex streams
//! - **Render Cache**: Mesh-owned tessellation cache validated by change count
//! - **Primitives**: Quad, cube and prism generators

pub mod bounds;
pub mod image;
pub mod math;
pub mod mesh;
pub mod primitives;
pub mod render_cache;
pub mod stream;
pub mod tessellate;
pub mod vertex;

#[cfg(test)]
mod testing;

pub use bounds::{BoundsCache, BoundsState};
pub use image::{GpuTextureHandle, ImageBuffer, TextureRef, TextureRegistrar};
pub use math::Aabb;
pub use mesh::{Face, FaceEdge, FaceId, Mesh, VertexId};
pub use render_cache::{RenderCache, RenderStreams};
pub use stream::{StreamVertex, VertexStreamSet};
pub use tessellate::{ColorFn, MeshTessellator};
pub use vertex::{VertexColor, VertexNormal, VertexPosition, VertexUv};

use thiserror::Error;

/// Core errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Face {face} references missing vertex {vertex}")]
    DanglingVertex { face: u32, vertex: u32 },

    #[error("Vertex {vertex} out of range (mesh has {count} vertices)")]
    VertexOutOfRange { vertex: u32, count: usize },

    #[error("Face {face} out of range (mesh has {count} faces)")]
    FaceOutOfRange { face: u32, count: usize },

    #[error("Expected {expected} UV coordinates, got {actual}")]
    UvCountMismatch { expected: usize, actual: usize },

    #[error("Invalid {width}x{height} RGBA image with {len} bytes")]
    InvalidImage { width: u32, height: u32, len: usize },
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
