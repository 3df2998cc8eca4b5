//! Helpers shared by this crate's tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use glam::Vec3;
use parking_lot::Mutex;

use crate::image::{GpuTextureHandle, TextureRef, TextureRegistrar};
use crate::mesh::{FaceId, Mesh};

/// Registrar that hands out sequential handles and remembers what it saw
#[derive(Debug, Default)]
pub(crate) struct CountingRegistrar {
    textures: Mutex<Vec<TextureRef>>,
    calls: AtomicUsize,
}

impl CountingRegistrar {
    /// Distinct textures registered
    pub(crate) fn registered(&self) -> usize {
        self.textures.lock().len()
    }

    /// Total `register` calls, including repeats
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl TextureRegistrar for CountingRegistrar {
    fn register(&self, texture: &TextureRef) -> GpuTextureHandle {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let mut textures = self.textures.lock();
        let index = match textures.iter().position(|t| std::sync::Arc::ptr_eq(t, texture)) {
            Some(index) => index,
            None => {
                textures.push(texture.clone());
                textures.len() - 1
            }
        };
        GpuTextureHandle(index as u32)
    }
}

/// One separate triangle per entry, each with the given texture
pub(crate) fn strip_mesh(textures: &[Option<TextureRef>]) -> Mesh {
    let mut mesh = Mesh::new();
    for (i, texture) in textures.iter().enumerate() {
        let x = i as f32;
        let a = mesh.add_vertex(Vec3::new(x, 0.0, 0.0));
        let b = mesh.add_vertex(Vec3::new(x + 1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Vec3::new(x, 1.0, 0.0));
        let face: FaceId = mesh.add_face(&[a, b, c]).unwrap();
        mesh.set_face_texture(face, texture.clone()).unwrap();
    }
    mesh
}
