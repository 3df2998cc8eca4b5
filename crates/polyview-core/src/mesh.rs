//! Polygon Mesh
//!
//! Read-mostly polygon mesh consumed by the tessellator and bounds cache:
//! - Vertex positions and polygonal faces with per-edge UVs
//! - Flat face normals (Newell's method), kept current on every edit
//! - Optional per-face texture and optional precomputed convex hull
//! - A change counter bumped on every structural or geometric edit
//!
//! The mesh owns its [`BoundsCache`] and [`RenderCache`] directly, so cached
//! data lives exactly as long as the mesh it describes.

use glam::{Mat4, Vec2, Vec3};
use smallvec::SmallVec;

use crate::bounds::BoundsCache;
use crate::image::TextureRef;
use crate::math::Aabb;
use crate::render_cache::{RenderCache, RenderStreams};
use crate::tessellate::MeshTessellator;
use crate::{CoreError, CoreResult};

/// Index of a vertex within its mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Position in the mesh's vertex storage
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a face within its mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub u32);

impl FaceId {
    /// Position in the mesh's face storage
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One edge of a face loop: the vertex it starts at and that corner's UV
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceEdge {
    /// First vertex of the edge
    pub vertex: VertexId,
    /// Texture coordinate at that vertex, for this face
    pub uv: Vec2,
}

impl FaceEdge {
    /// Create a face edge
    pub fn new(vertex: VertexId, uv: Vec2) -> Self {
        Self { vertex, uv }
    }
}

/// A polygonal face
#[derive(Debug, Clone)]
pub struct Face {
    edges: SmallVec<[FaceEdge; 4]>,
    normal: Vec3,
    texture: Option<TextureRef>,
}

impl Face {
    /// Create a face from its edge loop. The normal is filled in by the mesh.
    pub fn new(edges: impl IntoIterator<Item = FaceEdge>, texture: Option<TextureRef>) -> Self {
        Self {
            edges: edges.into_iter().collect(),
            normal: Vec3::ZERO,
            texture,
        }
    }

    /// Edge loop in winding order
    pub fn edges(&self) -> &[FaceEdge] {
        &self.edges
    }

    /// Number of edges (and corners)
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Flat face normal; zero for degenerate faces
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Texture applied to this face
    pub fn texture(&self) -> Option<&TextureRef> {
        self.texture.as_ref()
    }

    /// Faces with fewer than three corners produce no triangles
    pub fn is_degenerate(&self) -> bool {
        self.edges.len() < 3
    }

    /// Recompute the normal from current vertex positions.
    ///
    /// Edges referencing missing vertices are ignored here; the tessellator
    /// reports them.
    fn update_normal(&mut self, vertices: &[Vec3]) {
        if self.is_degenerate() {
            self.normal = Vec3::ZERO;
            return;
        }
        let mut normal = Vec3::ZERO;
        let count = self.edges.len();
        for i in 0..count {
            let (Some(current), Some(next)) = (
                vertices.get(self.edges[i].vertex.index()),
                vertices.get(self.edges[(i + 1) % count].vertex.index()),
            ) else {
                continue;
            };
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
        }
        self.normal = normal.normalize_or_zero();
    }
}

/// Polygon mesh with owned render and bounds caches
#[derive(Debug, Default)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    faces: Vec<Face>,
    convex_hull: Option<Vec<Vec3>>,
    change_count: u64,
    bounds: BoundsCache,
    render_cache: RenderCache,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a mesh from raw storage without validating vertex references.
    ///
    /// Intended for importers; dangling references surface as an error when
    /// the mesh is tessellated.
    pub fn from_parts(vertices: Vec<Vec3>, faces: Vec<Face>) -> Self {
        let mut mesh = Self {
            vertices,
            faces,
            ..Self::default()
        };
        for face in &mut mesh.faces {
            face.update_normal(&mesh.vertices);
        }
        mesh
    }

    /// Vertex positions
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Position of one vertex
    pub fn vertex_position(&self, id: VertexId) -> Option<Vec3> {
        self.vertices.get(id.index()).copied()
    }

    /// Faces in storage order
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Look up a face
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id.index())
    }

    /// Stored convex hull positions, if any
    pub fn convex_hull(&self) -> Option<&[Vec3]> {
        self.convex_hull.as_deref()
    }

    /// Edit counter; strictly increases on every edit
    pub fn change_count(&self) -> u64 {
        self.change_count
    }

    /// Add a vertex
    pub fn add_vertex(&mut self, position: Vec3) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(position);
        self.geometry_changed();
        id
    }

    /// Add a face over existing vertices with zero UVs
    pub fn add_face(&mut self, vertices: &[VertexId]) -> CoreResult<FaceId> {
        let uvs = vec![Vec2::ZERO; vertices.len()];
        self.add_face_with_uvs(vertices, &uvs)
    }

    /// Add a face over existing vertices with one UV per corner
    pub fn add_face_with_uvs(&mut self, vertices: &[VertexId], uvs: &[Vec2]) -> CoreResult<FaceId> {
        if vertices.len() != uvs.len() {
            return Err(CoreError::UvCountMismatch {
                expected: vertices.len(),
                actual: uvs.len(),
            });
        }
        for &vertex in vertices {
            self.check_vertex(vertex)?;
        }

        let mut face = Face::new(
            vertices.iter().zip(uvs).map(|(&vertex, &uv)| FaceEdge::new(vertex, uv)),
            None,
        );
        face.update_normal(&self.vertices);

        let id = FaceId(self.faces.len() as u32);
        self.faces.push(face);
        self.bump();
        Ok(id)
    }

    /// Apply or clear a face's texture
    pub fn set_face_texture(&mut self, face: FaceId, texture: Option<TextureRef>) -> CoreResult<()> {
        let count = self.faces.len();
        let target = self
            .faces
            .get_mut(face.index())
            .ok_or(CoreError::FaceOutOfRange { face: face.0, count })?;
        target.texture = texture;
        self.bump();
        Ok(())
    }

    /// Move a vertex, refreshing the normals of faces that use it
    pub fn set_vertex_position(&mut self, vertex: VertexId, position: Vec3) -> CoreResult<()> {
        self.check_vertex(vertex)?;
        self.vertices[vertex.index()] = position;

        let vertices = &self.vertices;
        for face in &mut self.faces {
            if face.edges.iter().any(|edge| edge.vertex == vertex) {
                face.update_normal(vertices);
            }
        }
        self.geometry_changed();
        Ok(())
    }

    /// Transform every vertex position by `matrix`
    pub fn transform(&mut self, matrix: Mat4) {
        for position in &mut self.vertices {
            *position = matrix.transform_point3(*position);
        }
        let vertices = &self.vertices;
        for face in &mut self.faces {
            face.update_normal(vertices);
        }
        self.geometry_changed();
    }

    /// Replace the stored convex hull.
    ///
    /// Hull regeneration is not an edit: the change counter is untouched and
    /// cached bounds are kept. Call [`Mesh::invalidate_bounds`] if the new hull
    /// changes the mesh's extent.
    pub fn set_convex_hull(&mut self, hull: Option<Vec<Vec3>>) {
        self.convex_hull = hull;
    }

    /// Bounds of the mesh under `transform`, served from the bounds cache
    pub fn bounds(&self, transform: Mat4) -> Aabb {
        self.bounds.get(self, transform)
    }

    /// Force the next [`Mesh::bounds`] call to recompute
    pub fn invalidate_bounds(&self) {
        self.bounds.invalidate();
    }

    /// The mesh's bounds cache
    pub fn bounds_cache(&self) -> &BoundsCache {
        &self.bounds
    }

    /// Vertex streams for this mesh, rebuilt only when the mesh has changed
    pub fn render_streams(&self, tessellator: &MeshTessellator<'_>) -> CoreResult<RenderStreams> {
        self.render_cache.get_or_build(self, tessellator)
    }

    /// Drop cached render streams, e.g. after switching color functions
    pub fn invalidate_render_cache(&self) {
        self.render_cache.invalidate();
    }

    /// The mesh's render cache
    pub fn render_cache(&self) -> &RenderCache {
        &self.render_cache
    }

    fn check_vertex(&self, vertex: VertexId) -> CoreResult<()> {
        if vertex.index() >= self.vertices.len() {
            return Err(CoreError::VertexOutOfRange {
                vertex: vertex.0,
                count: self.vertices.len(),
            });
        }
        Ok(())
    }

    fn bump(&mut self) {
        self.change_count += 1;
    }

    /// Positions moved: the stored hull is stale and cached bounds are invalid
    fn geometry_changed(&mut self) {
        self.convex_hull = None;
        self.bounds.invalidate();
        self.bump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::image::ImageBuffer;

    fn unit_quad() -> (Mesh, FaceId) {
        let mut mesh = Mesh::new();
        let v: Vec<_> = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
        .into_iter()
        .map(|p| mesh.add_vertex(p))
        .collect();
        let face = mesh.add_face(&v).unwrap();
        (mesh, face)
    }

    #[test]
    fn test_face_normal() {
        let (mesh, face) = unit_quad();
        let normal = mesh.face(face).unwrap().normal();
        assert!((normal - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_degenerate_face_has_zero_normal() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Vec3::ZERO);
        let b = mesh.add_vertex(Vec3::X);
        let face = mesh.add_face(&[a, b]).unwrap();
        let face = mesh.face(face).unwrap();
        assert!(face.is_degenerate());
        assert_eq!(face.normal(), Vec3::ZERO);
    }

    #[test]
    fn test_change_count_increases_on_every_edit() {
        let (mut mesh, face) = unit_quad();
        let mut last = mesh.change_count();
        assert_eq!(last, 5);

        mesh.set_face_texture(face, Some(Arc::new(ImageBuffer::new(1, 1)))).unwrap();
        assert!(mesh.change_count() > last);
        last = mesh.change_count();

        mesh.set_vertex_position(VertexId(0), Vec3::splat(-1.0)).unwrap();
        assert!(mesh.change_count() > last);
        last = mesh.change_count();

        mesh.transform(Mat4::from_scale(Vec3::splat(2.0)));
        assert!(mesh.change_count() > last);
    }

    #[test]
    fn test_hull_replacement_is_not_an_edit() {
        let (mut mesh, _) = unit_quad();
        let before = mesh.change_count();
        mesh.set_convex_hull(Some(mesh.vertices().to_vec()));
        assert_eq!(mesh.change_count(), before);
        assert_eq!(mesh.convex_hull().map(<[Vec3]>::len), Some(4));
    }

    #[test]
    fn test_geometry_edit_drops_hull() {
        let (mut mesh, _) = unit_quad();
        mesh.set_convex_hull(Some(mesh.vertices().to_vec()));
        mesh.set_vertex_position(VertexId(2), Vec3::new(2.0, 2.0, 0.0)).unwrap();
        assert!(mesh.convex_hull().is_none());
    }

    #[test]
    fn test_add_face_validation() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Vec3::ZERO);

        let err = mesh.add_face(&[a, VertexId(7)]).unwrap_err();
        assert!(matches!(err, CoreError::VertexOutOfRange { vertex: 7, count: 1 }));

        let err = mesh.add_face_with_uvs(&[a], &[]).unwrap_err();
        assert!(matches!(err, CoreError::UvCountMismatch { expected: 1, actual: 0 }));

        let err = mesh.set_face_texture(FaceId(3), None).unwrap_err();
        assert!(matches!(err, CoreError::FaceOutOfRange { face: 3, count: 0 }));
    }

    #[test]
    fn test_set_vertex_position_updates_normals() {
        let (mut mesh, face) = unit_quad();
        // Rotate the quad into the XZ plane.
        mesh.set_vertex_position(VertexId(2), Vec3::new(1.0, 0.0, -1.0)).unwrap();
        mesh.set_vertex_position(VertexId(3), Vec3::new(0.0, 0.0, -1.0)).unwrap();
        let normal = mesh.face(face).unwrap().normal();
        assert!((normal - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_from_parts_computes_normals() {
        let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let face = Face::new(
            [0, 1, 2].map(|i| FaceEdge::new(VertexId(i), Vec2::ZERO)),
            None,
        );
        let mesh = Mesh::from_parts(vertices, vec![face]);
        assert!((mesh.faces()[0].normal() - Vec3::Z).length() < 1e-6);
        assert_eq!(mesh.change_count(), 0);
    }
}
