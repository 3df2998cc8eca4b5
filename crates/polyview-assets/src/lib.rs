//! # Polyview Assets
//!
//! Image provider and texture registry for the Polyview viewer.
//!
//! ## Features
//! - Path-hashed asset IDs
//! - In-memory static data store with base-path mapping
//! - Retention of small images as shared textures
//! - Idempotent GPU texture registration with a pending-upload queue

pub mod registry;
pub mod static_data;

pub use registry::GpuTextureRegistry;
pub use static_data::StaticData;

use std::path::{Path, PathBuf};

use polyview_core::{CoreError, ImageBuffer, TextureRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Asset errors
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;

/// Asset ID hashed from a mapped path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    /// Create an asset ID from a path
    pub fn from_path(path: &Path) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Static data configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Root every relative path is resolved against
    pub base_path: PathBuf,
    /// Sub-directory of `base_path` holding icons
    pub icon_dir: PathBuf,
    /// Images smaller than this in both dimensions are retained and shared
    pub max_cached_dimension: u32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("StaticData"),
            icon_dir: PathBuf::from("Icons"),
            max_cached_dimension: 200,
        }
    }
}

/// Source of images and shared textures
pub trait ImageProvider: Send + Sync {
    /// Owned copy of the image at `path`
    fn load_image(&self, path: &Path) -> AssetResult<ImageBuffer>;

    /// Shared texture for the image at `path`
    fn load_texture(&self, path: &Path) -> AssetResult<TextureRef>;
}
