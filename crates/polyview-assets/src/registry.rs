//! GPU texture registry
//!
//! Hands out one [`GpuTextureHandle`] per texture allocation. The registry keeps
//! a clone of every registered [`TextureRef`], so an address it has seen cannot
//! be freed and reused by a different image while the registration stands.
//! Newly registered textures wait in an upload queue until the renderer drains
//! it.
//!
//! Registrations are released by [`GpuTextureRegistry::collect_unused`] once
//! the registry holds the last reference to a texture. Handles are never
//! reused.

use std::collections::VecDeque;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;
use polyview_core::{GpuTextureHandle, TextureRef, TextureRegistrar};

#[derive(Default)]
struct RegistryState {
    /// Allocation address to handle
    handles: AHashMap<usize, GpuTextureHandle>,
    /// Registered textures by handle
    textures: AHashMap<GpuTextureHandle, TextureRef>,
    /// Handles registered but not yet uploaded, oldest first
    pending: VecDeque<GpuTextureHandle>,
    next_handle: u32,
}

impl RegistryState {
    fn upload_entry(&self, handle: GpuTextureHandle) -> Option<(GpuTextureHandle, TextureRef)> {
        self.textures.get(&handle).map(|texture| (handle, texture.clone()))
    }
}

/// Identity-keyed texture registry with a pending-upload queue
#[derive(Default)]
pub struct GpuTextureRegistry {
    state: Mutex<RegistryState>,
}

impl GpuTextureRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of an already registered texture
    pub fn handle_of(&self, texture: &TextureRef) -> Option<GpuTextureHandle> {
        self.state.lock().handles.get(&texture_key(texture)).copied()
    }

    /// Texture registered under `handle`
    pub fn texture(&self, handle: GpuTextureHandle) -> Option<TextureRef> {
        self.state.lock().textures.get(&handle).cloned()
    }

    /// Remove up to `limit` textures from the upload queue, in registration order
    pub fn take_pending_uploads(&self, limit: usize) -> Vec<(GpuTextureHandle, TextureRef)> {
        let mut state = self.state.lock();
        let count = limit.min(state.pending.len());
        let handles: Vec<GpuTextureHandle> = state.pending.drain(..count).collect();
        handles
            .into_iter()
            .filter_map(|handle| state.upload_entry(handle))
            .collect()
    }

    /// Remove exactly the queued uploads among `handles`, in registration order.
    ///
    /// Handles that are not queued are ignored; the rest of the queue is left
    /// untouched.
    pub fn take_pending(&self, handles: &[GpuTextureHandle]) -> Vec<(GpuTextureHandle, TextureRef)> {
        let mut state = self.state.lock();
        let mut taken = Vec::new();
        state.pending.retain(|handle| {
            let wanted = handles.contains(handle);
            if wanted {
                taken.push(*handle);
            }
            !wanted
        });
        taken
            .into_iter()
            .filter_map(|handle| state.upload_entry(handle))
            .collect()
    }

    /// Release every texture only the registry still references.
    ///
    /// Returns the released handles so the GPU side can free them. Released
    /// textures still waiting for upload are dropped from the queue.
    pub fn collect_unused(&self) -> Vec<GpuTextureHandle> {
        let mut state = self.state.lock();
        let mut released: Vec<GpuTextureHandle> = state
            .textures
            .iter()
            .filter(|(_, texture)| Arc::strong_count(texture) == 1)
            .map(|(&handle, _)| handle)
            .collect();
        if released.is_empty() {
            return released;
        }
        released.sort_unstable();

        for handle in &released {
            if let Some(texture) = state.textures.remove(handle) {
                state.handles.remove(&texture_key(&texture));
            }
        }
        state.pending.retain(|handle| released.binary_search(handle).is_err());
        log::debug!(
            "Released {} unused textures ({} still registered)",
            released.len(),
            state.textures.len()
        );
        released
    }

    /// Number of textures currently registered
    pub fn registered_count(&self) -> usize {
        self.state.lock().textures.len()
    }

    /// Number of textures still waiting for upload
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }
}

impl TextureRegistrar for GpuTextureRegistry {
    fn register(&self, texture: &TextureRef) -> GpuTextureHandle {
        let mut state = self.state.lock();
        let key = texture_key(texture);
        if let Some(&handle) = state.handles.get(&key) {
            return handle;
        }

        let handle = GpuTextureHandle(state.next_handle);
        state.next_handle += 1;
        state.textures.insert(handle, texture.clone());
        state.handles.insert(key, handle);
        state.pending.push_back(handle);
        log::debug!(
            "Registered {}x{} texture as handle {}",
            texture.width(),
            texture.height(),
            handle.0
        );
        handle
    }
}

fn texture_key(texture: &TextureRef) -> usize {
    Arc::as_ptr(texture) as usize
}
