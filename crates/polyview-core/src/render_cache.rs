//! Render cache
//!
//! Holds the tessellated streams of one mesh, tagged with the mesh change count
//! they were built from. A request with a matching count returns the cached
//! streams untouched; any other count rebuilds and replaces them.
//!
//! The cache key is the change count only. Switching the tessellator's color
//! function on an unchanged mesh keeps serving the old colors until
//! [`RenderCache::invalidate`] is called.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::CoreResult;
use crate::mesh::Mesh;
use crate::stream::VertexStreamSet;
use crate::tessellate::MeshTessellator;

/// Immutable, shareable tessellation result
pub type RenderStreams = Arc<[VertexStreamSet]>;

#[derive(Debug)]
struct CacheEntry {
    change_count: u64,
    streams: RenderStreams,
}

/// Mesh-owned cache of tessellated vertex streams
#[derive(Debug, Default)]
pub struct RenderCache {
    /// Protects the {tag, streams} pair; held across rebuilds
    entry: Mutex<Option<CacheEntry>>,
    rebuild_count: AtomicU64,
}

impl RenderCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached streams for `mesh`, rebuilt with `tessellator` if the mesh has
    /// changed since they were built.
    ///
    /// Holders of a previously returned [`RenderStreams`] keep a valid, if
    /// outdated, copy after a rebuild. A failed build leaves the existing entry
    /// in place.
    pub fn get_or_build(
        &self,
        mesh: &Mesh,
        tessellator: &MeshTessellator<'_>,
    ) -> CoreResult<RenderStreams> {
        let mut entry = self.entry.lock();
        let change_count = mesh.change_count();

        if let Some(cached) = entry.as_ref() {
            if cached.change_count == change_count {
                return Ok(cached.streams.clone());
            }
        }

        let streams: RenderStreams = tessellator.build(mesh)?.into();
        log::debug!(
            "Rebuilt render streams at change count {} (previous: {:?})",
            change_count,
            entry.as_ref().map(|cached| cached.change_count),
        );
        *entry = Some(CacheEntry {
            change_count,
            streams: streams.clone(),
        });
        self.rebuild_count.fetch_add(1, Ordering::Relaxed);
        Ok(streams)
    }

    /// Drop the cached streams so the next request rebuilds
    pub fn invalidate(&self) {
        *self.entry.lock() = None;
    }

    /// Change count the cached streams were built at, if any
    pub fn cached_change_count(&self) -> Option<u64> {
        self.entry.lock().as_ref().map(|cached| cached.change_count)
    }

    /// Number of tessellations performed
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    use crate::mesh::{Face, FaceEdge, VertexId};
    use crate::primitives;
    use crate::testing::CountingRegistrar;
    use crate::vertex::VertexColor;

    fn triangle_count(streams: &RenderStreams) -> usize {
        streams.iter().map(VertexStreamSet::triangle_count).sum()
    }

    #[test]
    fn test_second_request_returns_same_streams() {
        let mesh = primitives::cube(1.0);
        let registrar = CountingRegistrar::default();
        let tessellator = MeshTessellator::new(&registrar);

        let first = mesh.render_streams(&tessellator).unwrap();
        let second = mesh.render_streams(&tessellator).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(mesh.render_cache().rebuild_count(), 1);
        assert_eq!(mesh.render_cache().cached_change_count(), Some(mesh.change_count()));
    }

    #[test]
    fn test_edit_triggers_rebuild() {
        let mut mesh = primitives::quad(1.0);
        let registrar = CountingRegistrar::default();
        let tessellator = MeshTessellator::new(&registrar);

        let before = mesh.render_streams(&tessellator).unwrap();
        assert_eq!(triangle_count(&before), 2);

        let extra = mesh.add_vertex(Vec3::new(0.5, 2.0, 0.0));
        mesh.add_face(&[VertexId(3), VertexId(2), extra]).unwrap();

        let after = mesh.render_streams(&tessellator).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(triangle_count(&after), 3);
        // The old snapshot is untouched.
        assert_eq!(triangle_count(&before), 2);
        assert_eq!(mesh.render_cache().rebuild_count(), 2);
    }

    #[test]
    fn test_color_change_needs_explicit_invalidate() {
        let mesh = primitives::quad(1.0);
        let registrar = CountingRegistrar::default();
        let red = |_: Vec3| VertexColor::new(255, 0, 0);
        let blue = |_: Vec3| VertexColor::new(0, 0, 255);

        let first = mesh
            .render_streams(&MeshTessellator::new(&registrar).with_vertex_colors(&red))
            .unwrap();
        let blue_tessellator = MeshTessellator::new(&registrar).with_vertex_colors(&blue);

        let stale = mesh.render_streams(&blue_tessellator).unwrap();
        assert!(Arc::ptr_eq(&first, &stale));
        assert_eq!(stale[0].colors()[0], VertexColor::new(255, 0, 0));

        mesh.invalidate_render_cache();
        assert_eq!(mesh.render_cache().cached_change_count(), None);
        let fresh = mesh.render_streams(&blue_tessellator).unwrap();
        assert_eq!(fresh[0].colors()[0], VertexColor::new(0, 0, 255));
    }

    #[test]
    fn test_failed_build_keeps_entry() {
        let edges = |ids: [u32; 3]| ids.map(|i| FaceEdge::new(VertexId(i), Vec2::ZERO));
        let good = Mesh::from_parts(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![Face::new(edges([0, 1, 2]), None)]);
        let mut bad = Mesh::from_parts(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![Face::new(edges([0, 1, 9]), None)]);
        bad.add_vertex(Vec3::Z);

        let cache = RenderCache::new();
        let registrar = CountingRegistrar::default();
        let tessellator = MeshTessellator::new(&registrar);

        let built = cache.get_or_build(&good, &tessellator).unwrap();
        assert!(cache.get_or_build(&bad, &tessellator).is_err());

        assert_eq!(cache.cached_change_count(), Some(0));
        let again = cache.get_or_build(&good, &tessellator).unwrap();
        assert!(Arc::ptr_eq(&built, &again));
        assert_eq!(cache.rebuild_count(), 1);
    }

    #[test]
    fn test_concurrent_requests_build_once() {
        let mesh = primitives::prism(12, 1.0, 2.0);
        let registrar = CountingRegistrar::default();
        let tessellator = MeshTessellator::new(&registrar);

        let results: Vec<RenderStreams> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| mesh.render_streams(&tessellator).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(mesh.render_cache().rebuild_count(), 1);
        assert!(results.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }
}
