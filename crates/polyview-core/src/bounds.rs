//! Transform-aware bounds cache
//!
//! Remembers the AABB of a mesh under the last transform it was asked for.
//! A query with a bit-identical transform is answered from a shared read of the
//! cached state; anything else recomputes from the mesh's convex hull (or all
//! of its vertices when no hull is stored) under a mutex.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Mat4;
use parking_lot::{Mutex, RwLock};

use crate::math::{Aabb, mat4_bits_eq};
use crate::mesh::Mesh;

/// Cached state: nothing yet, a box for one transform, or explicitly dropped
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundsState {
    /// No bounds computed since creation
    Uninitialized,
    /// Bounds valid for exactly this transform
    Valid {
        /// Transform the bounds were computed under
        transform: Mat4,
        /// Resulting world-space box
        aabb: Aabb,
    },
    /// Dropped by [`BoundsCache::invalidate`]; next query recomputes
    Invalidated,
}

impl BoundsState {
    fn lookup(&self, transform: &Mat4) -> Option<Aabb> {
        match self {
            Self::Valid { transform: cached, aabb } if mat4_bits_eq(cached, transform) => Some(*aabb),
            _ => None,
        }
    }
}

/// Per-mesh AABB cache keyed by transform
#[derive(Debug)]
pub struct BoundsCache {
    /// Protects the {transform, AABB} pair as one unit
    state: RwLock<BoundsState>,
    /// Serializes recomputation and invalidation
    recompute: Mutex<()>,
    recompute_count: AtomicU64,
}

impl BoundsCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BoundsState::Uninitialized),
            recompute: Mutex::new(()),
            recompute_count: AtomicU64::new(0),
        }
    }

    /// Bounds of `mesh` after applying `transform`.
    ///
    /// An empty mesh yields an empty (inverted) box; check [`Aabb::is_empty`]
    /// before using the result for intersection tests.
    pub fn get(&self, mesh: &Mesh, transform: Mat4) -> Aabb {
        if let Some(aabb) = self.state.read().lookup(&transform) {
            return aabb;
        }

        let _guard = self.recompute.lock();
        // Another caller may have computed this transform while we waited.
        if let Some(aabb) = self.state.read().lookup(&transform) {
            return aabb;
        }

        let aabb = match mesh.convex_hull() {
            Some(hull) => Aabb::from_transformed_points(hull.iter().copied(), transform),
            None => Aabb::from_transformed_points(mesh.vertices().iter().copied(), transform),
        };
        self.recompute_count.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "Recomputed bounds from {} points (hull: {})",
            mesh.convex_hull().map_or(mesh.vertex_count(), <[_]>::len),
            mesh.convex_hull().is_some(),
        );

        *self.state.write() = BoundsState::Valid { transform, aabb };
        aabb
    }

    /// Force the next [`BoundsCache::get`] to recompute, whatever transform it
    /// is given
    pub fn invalidate(&self) {
        let _guard = self.recompute.lock();
        *self.state.write() = BoundsState::Invalidated;
    }

    /// Current cached state
    pub fn state(&self) -> BoundsState {
        *self.state.read()
    }

    /// Number of times bounds were recomputed from geometry
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count.load(Ordering::Relaxed)
    }
}

impl Default for BoundsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    use crate::mesh::VertexId;

    fn points_mesh(points: &[Vec3]) -> Mesh {
        let mut mesh = Mesh::new();
        for &point in points {
            mesh.add_vertex(point);
        }
        mesh
    }

    #[test]
    fn test_bounds_exactness() {
        let points = [
            Vec3::new(-1.0, 0.5, 2.0),
            Vec3::new(3.0, -2.0, 0.0),
            Vec3::new(0.0, 4.0, -1.0),
        ];
        let mesh = points_mesh(&points);
        let transform = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 1.0, 0.5),
            Quat::from_rotation_y(0.3),
            Vec3::new(10.0, 0.0, -5.0),
        );

        let aabb = mesh.bounds(transform);

        let mut expected_min = Vec3::splat(f32::INFINITY);
        let mut expected_max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            let t = transform.transform_point3(p);
            expected_min = expected_min.min(t);
            expected_max = expected_max.max(t);
        }
        assert_eq!(aabb.min, expected_min);
        assert_eq!(aabb.max, expected_max);
    }

    #[test]
    fn test_same_transform_is_cached() {
        let mesh = points_mesh(&[Vec3::ZERO, Vec3::ONE]);
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

        let first = mesh.bounds(transform);
        let second = mesh.bounds(transform);

        assert_eq!(mesh.bounds_cache().recompute_count(), 1);
        assert_eq!(first.min.to_array().map(f32::to_bits), second.min.to_array().map(f32::to_bits));
        assert_eq!(first.max.to_array().map(f32::to_bits), second.max.to_array().map(f32::to_bits));
    }

    #[test]
    fn test_different_transform_recomputes() {
        let mesh = points_mesh(&[Vec3::ZERO, Vec3::ONE]);
        mesh.bounds(Mat4::IDENTITY);
        let moved = mesh.bounds(Mat4::from_translation(Vec3::X));
        assert_eq!(mesh.bounds_cache().recompute_count(), 2);
        assert_eq!(moved.min, Vec3::X);

        // Only the last transform is remembered.
        mesh.bounds(Mat4::IDENTITY);
        assert_eq!(mesh.bounds_cache().recompute_count(), 3);
    }

    #[test]
    fn test_nan_transform_is_cached() {
        let mesh = points_mesh(&[Vec3::ZERO, Vec3::ONE]);
        let transform = Mat4::from_scale(Vec3::new(f32::NAN, 1.0, 1.0));

        mesh.bounds(transform);
        mesh.bounds(transform);
        assert_eq!(mesh.bounds_cache().recompute_count(), 1);

        // A NaN with a different payload is a different matrix.
        let other = Mat4::from_scale(Vec3::new(-f32::NAN, 1.0, 1.0));
        mesh.bounds(other);
        assert_eq!(mesh.bounds_cache().recompute_count(), 2);
    }

    #[test]
    fn test_invalidate_forces_recompute() {
        let mut mesh = points_mesh(&[Vec3::ZERO, Vec3::ONE]);
        mesh.set_convex_hull(Some(vec![Vec3::ZERO, Vec3::ONE]));
        let before = mesh.bounds(Mat4::IDENTITY);
        assert_eq!(before.max, Vec3::ONE);

        // Regenerating the hull changes the extent without an edit.
        mesh.set_convex_hull(Some(vec![Vec3::ZERO, Vec3::splat(5.0)]));
        assert_eq!(mesh.bounds(Mat4::IDENTITY).max, Vec3::ONE);

        mesh.invalidate_bounds();
        assert_eq!(mesh.bounds_cache().state(), BoundsState::Invalidated);
        let after = mesh.bounds(Mat4::IDENTITY);
        assert_eq!(after.max, Vec3::splat(5.0));
        assert_eq!(mesh.bounds_cache().recompute_count(), 2);
    }

    #[test]
    fn test_hull_preferred_over_vertices() {
        let mut mesh = points_mesh(&[Vec3::ZERO, Vec3::splat(0.5), Vec3::ONE]);
        mesh.set_convex_hull(Some(vec![Vec3::splat(-2.0), Vec3::splat(2.0)]));
        let aabb = mesh.bounds(Mat4::IDENTITY);
        assert_eq!(aabb.min, Vec3::splat(-2.0));
        assert_eq!(aabb.max, Vec3::splat(2.0));
    }

    #[test]
    fn test_geometry_edit_invalidates() {
        let mut mesh = points_mesh(&[Vec3::ZERO, Vec3::ONE]);
        assert_eq!(mesh.bounds(Mat4::IDENTITY).max, Vec3::ONE);

        mesh.set_vertex_position(VertexId(1), Vec3::splat(3.0)).unwrap();
        assert_eq!(mesh.bounds(Mat4::IDENTITY).max, Vec3::splat(3.0));
    }

    #[test]
    fn test_empty_mesh_gives_empty_box() {
        let mesh = Mesh::new();
        let aabb = mesh.bounds(Mat4::IDENTITY);
        assert!(aabb.is_empty());
        assert_eq!(aabb, Aabb::EMPTY);
        assert!(matches!(mesh.bounds_cache().state(), BoundsState::Valid { .. }));
    }

    #[test]
    fn test_concurrent_queries_compute_once() {
        let mesh = points_mesh(&[Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0)]);
        let transform = Mat4::from_rotation_z(1.0);
        let expected = Aabb::from_transformed_points(mesh.vertices().iter().copied(), transform);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        assert_eq!(mesh.bounds(transform), expected);
                    }
                });
            }
        });

        assert_eq!(mesh.bounds_cache().recompute_count(), 1);
    }
}
