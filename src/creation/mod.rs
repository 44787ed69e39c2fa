//! Builds fully populated asset records from image files.

mod hashing;
mod metadata;
mod video;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::catalog::{Asset, Folder, MetadataFlag, read_facts};
use crate::config::CatalogSettings;

pub use hashing::{
    ConfiguredHashCalculator, HashCalculator, HashError, content_hash, difference_hash,
    perceptual_hash,
};
pub use metadata::{ExtractedMetadata, ImageMetadataExtractor, MetadataError, MetadataExtractor};
pub use video::{FfmpegFrameExtractor, FrameError, FrameExtractor};

/// Reasons an asset could not be created. None of them abort a sync.
#[derive(Debug, Error)]
pub enum CreationError {
    #[error("Image {path} is corrupted: {message}")]
    Corrupted { path: PathBuf, message: String },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Path {0} has no usable file name")]
    InvalidPath(PathBuf),
    #[error(transparent)]
    Metadata(MetadataError),
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl From<MetadataError> for CreationError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::Corrupted { path, message } => CreationError::Corrupted { path, message },
            MetadataError::Io { path, source } => CreationError::Io { path, source },
            other => CreationError::Metadata(other),
        }
    }
}

/// New asset record together with its encoded thumbnail.
#[derive(Debug, Clone)]
pub struct CreatedAsset {
    pub asset: Asset,
    pub thumbnail: Vec<u8>,
}

/// Reads file facts, extracts metadata and hashes, and assembles an [`Asset`].
#[derive(Clone)]
pub struct AssetCreationService {
    extractor: Arc<dyn MetadataExtractor>,
    hasher: Arc<dyn HashCalculator>,
}

impl AssetCreationService {
    pub fn new(extractor: Arc<dyn MetadataExtractor>, hasher: Arc<dyn HashCalculator>) -> Self {
        Self { extractor, hasher }
    }

    /// Service using the `image` decoders and the configured hash set.
    pub fn from_settings(settings: &CatalogSettings) -> Self {
        Self::new(
            Arc::new(ImageMetadataExtractor::new(
                settings.thumbnail_max_width,
                settings.thumbnail_max_height,
            )),
            Arc::new(ConfiguredHashCalculator::new(&settings.hash_algorithms)),
        )
    }

    pub fn create_asset(&self, path: &Path, folder: &Folder) -> Result<CreatedAsset, CreationError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| CreationError::InvalidPath(path.to_path_buf()))?
            .to_string();
        let facts = read_facts(path).map_err(|source| CreationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let extracted = self.extractor.extract(path)?;
        let hashes = self.hasher.calculate(path, &extracted.image)?;

        let asset = Asset {
            folder_id: folder.id.clone(),
            folder: folder.clone(),
            file_name,
            file_size: facts.size,
            created_ns: facts.created_ns,
            modified_ns: facts.modified_ns,
            pixels: extracted.pixels,
            thumbnail_pixels: extracted.thumbnail_pixels,
            rotation: extracted.rotation,
            hashes,
            corrupted: MetadataFlag::default(),
            rotated: extracted.rotated,
            thumbnail_created_at: now_epoch_seconds(),
        };
        Ok(CreatedAsset {
            asset,
            thumbnail: extracted.thumbnail,
        })
    }
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests;
