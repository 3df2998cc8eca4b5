//! In-memory static data
//!
//! Images live under paths relative to [`AssetConfig::base_path`]. Every path
//! is mapped to a normalized full path and keyed by its [`AssetId`], so
//! `Icons/../Icons/a.png` and `Icons/a.png` name the same image.
//!
//! Small images are retained as shared textures after their first load; larger
//! ones are handed out as a fresh copy every time.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use polyview_core::{ImageBuffer, TextureRef};

use crate::{AssetConfig, AssetError, AssetId, AssetResult, ImageProvider};

/// Content-addressed image store
pub struct StaticData {
    config: AssetConfig,
    /// Source images by mapped path
    images: RwLock<AHashMap<AssetId, ImageBuffer>>,
    /// Shared textures for images below the retention size
    retained: RwLock<AHashMap<AssetId, TextureRef>>,
}

impl StaticData {
    /// Create an empty store
    pub fn new(config: AssetConfig) -> Self {
        Self {
            config,
            images: RwLock::new(AHashMap::new()),
            retained: RwLock::new(AHashMap::new()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Resolve `path` against the base path, folding `.` and `..` lexically
    pub fn map_path(&self, path: impl AsRef<Path>) -> PathBuf {
        normalize(&self.config.base_path.join(path))
    }

    /// ID of the image stored (or to be stored) at `path`
    pub fn id_for(&self, path: impl AsRef<Path>) -> AssetId {
        AssetId::from_path(&self.map_path(path))
    }

    /// Store `image` at `path`, replacing any previous image there
    pub fn insert(&self, path: impl AsRef<Path>, image: ImageBuffer) -> AssetId {
        let mapped = self.map_path(path);
        let id = AssetId::from_path(&mapped);
        log::debug!(
            "Storing {}x{} image {} at {}",
            image.width(),
            image.height(),
            id,
            mapped.display()
        );
        self.images.write().insert(id, image);
        self.retained.write().remove(&id);
        id
    }

    /// Store raw RGBA8 pixels at `path`
    pub fn insert_rgba(
        &self,
        path: impl AsRef<Path>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> AssetResult<AssetId> {
        let image = ImageBuffer::from_rgba(width, height, pixels)?;
        Ok(self.insert(path, image))
    }

    /// Remove the image at `path`, returning whether one was stored
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        let id = self.id_for(path);
        self.retained.write().remove(&id);
        self.images.write().remove(&id).is_some()
    }

    /// Whether an image is stored at `path`
    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        self.contains(self.id_for(path))
    }

    /// Whether an image with this ID is stored
    pub fn contains(&self, id: AssetId) -> bool {
        self.images.read().contains_key(&id)
    }

    /// Number of stored images
    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.read().is_empty()
    }

    /// Number of images currently shared as retained textures
    pub fn retained_count(&self) -> usize {
        self.retained.read().len()
    }

    /// Load an image from the icon directory
    pub fn load_icon(&self, path: impl AsRef<Path>) -> AssetResult<ImageBuffer> {
        self.load_image(&self.config.icon_dir.join(path))
    }

    /// Shared texture for an image in the icon directory
    pub fn load_icon_texture(&self, path: impl AsRef<Path>) -> AssetResult<TextureRef> {
        self.load_texture(&self.config.icon_dir.join(path))
    }

    fn is_retained_size(&self, image: &ImageBuffer) -> bool {
        image.width() < self.config.max_cached_dimension
            && image.height() < self.config.max_cached_dimension
    }

    fn not_found(&self, path: &Path) -> AssetError {
        AssetError::NotFound(self.map_path(path).display().to_string())
    }
}

impl Default for StaticData {
    fn default() -> Self {
        Self::new(AssetConfig::default())
    }
}

impl ImageProvider for StaticData {
    fn load_image(&self, path: &Path) -> AssetResult<ImageBuffer> {
        let id = self.id_for(path);
        if let Some(texture) = self.retained.read().get(&id) {
            return Ok(ImageBuffer::clone(texture));
        }
        self.images
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| self.not_found(path))
    }

    fn load_texture(&self, path: &Path) -> AssetResult<TextureRef> {
        let id = self.id_for(path);
        if let Some(texture) = self.retained.read().get(&id) {
            return Ok(texture.clone());
        }

        let images = self.images.read();
        let image = images.get(&id).ok_or_else(|| self.not_found(path))?;
        if !self.is_retained_size(image) {
            log::trace!("Image {} is too large to retain", id);
            return Ok(Arc::new(image.clone()));
        }

        // Another loader may have retained it between the two locks.
        let mut retained = self.retained.write();
        let texture = retained
            .entry(id)
            .or_insert_with(|| Arc::new(image.clone()))
            .clone();
        Ok(texture)
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
