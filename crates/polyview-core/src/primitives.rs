//! Primitive meshes
//!
//! Small generators used by the viewer, the CLI and benchmarks. All faces wind
//! counter-clockwise when seen from outside.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use crate::mesh::{Face, FaceEdge, Mesh, VertexId};

/// Square of side `size` in the XY plane, centered on the origin, facing +Z
pub fn quad(size: f32) -> Mesh {
    let h = size * 0.5;
    let vertices = vec![
        Vec3::new(-h, -h, 0.0),
        Vec3::new(h, -h, 0.0),
        Vec3::new(h, h, 0.0),
        Vec3::new(-h, h, 0.0),
    ];
    let square = face([0, 1, 2, 3].map(VertexId), unit_square_uvs());
    Mesh::from_parts(vertices, vec![square])
}

/// Axis-aligned cube of edge `size`, centered on the origin
pub fn cube(size: f32) -> Mesh {
    let h = size * 0.5;
    let vertices = vec![
        Vec3::new(-h, -h, -h),
        Vec3::new(h, -h, -h),
        Vec3::new(h, h, -h),
        Vec3::new(-h, h, -h),
        Vec3::new(-h, -h, h),
        Vec3::new(h, -h, h),
        Vec3::new(h, h, h),
        Vec3::new(-h, h, h),
    ];

    let faces = [
        [4, 5, 6, 7], // +Z
        [1, 0, 3, 2], // -Z
        [5, 1, 2, 6], // +X
        [0, 4, 7, 3], // -X
        [7, 6, 2, 3], // +Y
        [0, 1, 5, 4], // -Y
    ];
    let faces = faces
        .into_iter()
        .map(|corners| face(corners.map(VertexId), unit_square_uvs()))
        .collect();
    Mesh::from_parts(vertices, faces)
}

/// Right prism with a regular `sides`-gon cross-section along Z.
///
/// `sides` below 3 is raised to 3.
pub fn prism(sides: u32, radius: f32, height: f32) -> Mesh {
    let sides = sides.max(3) as usize;
    let half = height * 0.5;

    let ring: Vec<Vec2> = (0..sides)
        .map(|i| {
            let angle = i as f32 / sides as f32 * TAU;
            Vec2::new(angle.cos(), angle.sin())
        })
        .collect();
    let bottom = |i: usize| VertexId(i as u32);
    let top = |i: usize| VertexId((sides + i) as u32);
    let cap_uv = |d: Vec2| d * 0.5 + Vec2::splat(0.5);

    let vertices: Vec<Vec3> = [-half, half]
        .iter()
        .flat_map(|&z| ring.iter().map(move |d| Vec3::new(d.x * radius, d.y * radius, z)))
        .collect();

    let mut faces = Vec::with_capacity(sides + 2);
    faces.push(face((0..sides).map(top), ring.iter().map(|&d| cap_uv(d))));
    faces.push(face((0..sides).rev().map(bottom), ring.iter().rev().map(|&d| cap_uv(d))));
    for i in 0..sides {
        let next = (i + 1) % sides;
        let u0 = i as f32 / sides as f32;
        let u1 = (i + 1) as f32 / sides as f32;
        faces.push(face(
            [bottom(i), bottom(next), top(next), top(i)],
            [Vec2::new(u0, 0.0), Vec2::new(u1, 0.0), Vec2::new(u1, 1.0), Vec2::new(u0, 1.0)],
        ));
    }
    Mesh::from_parts(vertices, faces)
}

fn unit_square_uvs() -> [Vec2; 4] {
    [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)]
}

fn face(
    vertices: impl IntoIterator<Item = VertexId>,
    uvs: impl IntoIterator<Item = Vec2>,
) -> Face {
    Face::new(
        vertices.into_iter().zip(uvs).map(|(vertex, uv)| FaceEdge::new(vertex, uv)),
        None,
    )
}
