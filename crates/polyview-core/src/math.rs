//! Math utilities
//!
//! Re-exports from glam plus the axis-aligned box used by the bounds cache.

pub use glam::{Mat4, Quat, Vec2, Vec3};

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
///
/// A box with `min > max` on any axis is empty. [`Aabb::EMPTY`] is the
/// identity for [`Aabb::expand_to_include`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create an empty AABB
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create an AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounds of a set of points, each transformed by `matrix` first.
    ///
    /// Yields [`Aabb::EMPTY`] for an empty iterator.
    pub fn from_transformed_points<I>(points: I, matrix: Mat4) -> Self
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut result = Self::EMPTY;
        for point in points {
            result.expand_to_include(matrix.transform_point3(point));
        }
        result
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the full size of the AABB
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if the AABB is empty
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand the AABB to include a point
    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Bit-for-bit matrix equality.
///
/// Unlike `==`, this treats `-0.0` and `0.0` as different and a NaN element as
/// equal to itself, so a cached matrix only matches the exact value it was
/// stored with.
pub fn mat4_bits_eq(a: &Mat4, b: &Mat4) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| x.to_bits() == y.to_bits())
}
