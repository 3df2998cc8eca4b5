//! GPU vertex attribute records
//!
//! Each attribute lives in its own array so a sink can upload them as
//! separate vertex buffers with [`bytemuck::cast_slice`].

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Vertex position (3 × f32)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct VertexPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for VertexPosition {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<VertexPosition> for Vec3 {
    fn from(p: VertexPosition) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

/// Vertex normal (3 × f32)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct VertexNormal {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for VertexNormal {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

/// Texture coordinate (2 × f32)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct VertexUv {
    pub u: f32,
    pub v: f32,
}

impl From<Vec2> for VertexUv {
    fn from(uv: Vec2) -> Self {
        Self { u: uv.x, v: uv.y }
    }
}

/// Vertex color (3 × u8)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
pub struct VertexColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl VertexColor {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Create a color from its channels
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(std::mem::size_of::<VertexPosition>(), 12);
        assert_eq!(std::mem::size_of::<VertexNormal>(), 12);
        assert_eq!(std::mem::size_of::<VertexUv>(), 8);
        assert_eq!(std::mem::size_of::<VertexColor>(), 3);
    }

    #[test]
    fn test_cast_to_bytes() {
        let positions = [VertexPosition::from(Vec3::new(1.0, 2.0, 3.0))];
        let bytes: &[u8] = bytemuck::cast_slice(&positions);
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..4], &1.0f32.to_ne_bytes());
    }
}
