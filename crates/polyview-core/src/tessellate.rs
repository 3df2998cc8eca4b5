//! Mesh tessellation
//!
//! Converts polygon faces into GPU triangles in a single pass over the mesh:
//! - Each face is split into a triangle fan anchored at its first corner
//! - Every vertex carries the flat face normal, and optionally a flat color
//! - Consecutive faces with the same texture (by identity) share a
//!   [`VertexStreamSet`]; any texture change opens a new one
//!
//! Fan triangulation is exact for convex faces only. Non-convex faces are
//! emitted the same way and may overlap themselves.

use glam::{Vec2, Vec3};
use smallvec::SmallVec;

use crate::image::{TextureRegistrar, same_texture};
use crate::mesh::Mesh;
use crate::stream::{StreamVertex, VertexStreamSet};
use crate::vertex::VertexColor;
use crate::{CoreError, CoreResult};

/// Maps a face normal to the flat color of that face's vertices
pub type ColorFn<'a> = &'a (dyn Fn(Vec3) -> VertexColor + Sync);

/// Builds vertex streams from a mesh
pub struct MeshTessellator<'a> {
    registrar: &'a dyn TextureRegistrar,
    color_fn: Option<ColorFn<'a>>,
}

impl<'a> MeshTessellator<'a> {
    /// Create a tessellator that registers face textures with `registrar`
    pub fn new(registrar: &'a dyn TextureRegistrar) -> Self {
        Self {
            registrar,
            color_fn: None,
        }
    }

    /// Color every vertex by its face normal. Stream sets built by this
    /// tessellator are flagged to use vertex colors.
    pub fn with_vertex_colors(mut self, color_fn: ColorFn<'a>) -> Self {
        self.color_fn = Some(color_fn);
        self
    }

    /// Whether a color function is active
    pub fn uses_vertex_colors(&self) -> bool {
        self.color_fn.is_some()
    }

    /// Tessellate `mesh` into stream sets, in face order.
    ///
    /// Faces with fewer than three corners are skipped. A face referencing a
    /// vertex the mesh does not have fails the whole build.
    pub fn build(&self, mesh: &Mesh) -> CoreResult<Vec<VertexStreamSet>> {
        let vertices = mesh.vertices();
        let use_vertex_colors = self.uses_vertex_colors();

        let mut sets = Vec::new();
        let mut current: Option<VertexStreamSet> = None;
        let mut skipped = 0usize;

        for (face_index, face) in mesh.faces().iter().enumerate() {
            let texture = face.texture();
            // Registered before any vertex that samples it is emitted.
            let gpu_texture = texture.map(|texture| self.registrar.register(texture));

            let starts_group = current
                .as_ref()
                .is_none_or(|set| !same_texture(set.texture(), texture));
            if starts_group {
                sets.extend(current.take());
            }
            let set = current.get_or_insert_with(|| {
                VertexStreamSet::new(texture.cloned(), gpu_texture, use_vertex_colors)
            });

            let corners = face
                .edges()
                .iter()
                .map(|edge| {
                    vertices
                        .get(edge.vertex.index())
                        .map(|&position| (position, edge.uv))
                        .ok_or(CoreError::DanglingVertex {
                            face: face_index as u32,
                            vertex: edge.vertex.0,
                        })
                })
                .collect::<CoreResult<SmallVec<[(Vec3, Vec2); 8]>>>()?;

            if corners.len() < 3 {
                skipped += 1;
                log::trace!("Skipping face {} with {} corners", face_index, corners.len());
                continue;
            }

            let normal = face.normal();
            let color = self.color_fn.map_or(VertexColor::BLACK, |color_fn| color_fn(normal));
            let corner = |(position, uv): (Vec3, Vec2)| StreamVertex {
                position: position.into(),
                normal: normal.into(),
                uv: uv.into(),
                color,
            };

            let anchor = corner(corners[0]);
            for pair in corners[1..].windows(2) {
                set.push_triangle([anchor, corner(pair[0]), corner(pair[1])]);
            }
        }
        sets.extend(current);

        log::debug!(
            "Tessellated {} faces into {} stream sets ({} triangles, {} degenerate faces skipped)",
            mesh.face_count(),
            sets.len(),
            sets.iter().map(VertexStreamSet::triangle_count).sum::<usize>(),
            skipped,
        );
        Ok(sets)
    }
}
