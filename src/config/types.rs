use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app_dirs;

use super::ConfigError;
use super::defaults::{
    clamp_thumbnail_edge, default_assets_directory, default_batch_size, default_ffmpeg_program,
    default_hash_algorithms, default_thumbnail_max_height, default_thumbnail_max_width,
};

/// Hash families that can be recorded for every catalogued asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// Cryptographic digest of the file bytes.
    Content,
    /// Gradient (difference) hash of the decoded bitmap.
    Difference,
    /// DCT-based perceptual hash of the decoded bitmap.
    Perceptual,
}

/// Settings consumed by a sync pass, read before the pass starts.
///
/// Config keys (TOML): `assets_directory`, `catalog_batch_size`,
/// `thumbnail_max_width`, `thumbnail_max_height`, `hash_algorithms`,
/// `analyse_videos`, `first_frame_directory`, `ffmpeg_program`,
/// `excluded_directories`, `catalog_directory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_assets_directory")]
    pub assets_directory: PathBuf,
    /// Maximum number of assets created or updated by one sync; 0 validates only.
    #[serde(default = "default_batch_size")]
    pub catalog_batch_size: usize,
    #[serde(default = "default_thumbnail_max_width")]
    pub thumbnail_max_width: u32,
    #[serde(default = "default_thumbnail_max_height")]
    pub thumbnail_max_height: u32,
    #[serde(default = "default_hash_algorithms")]
    pub hash_algorithms: Vec<HashAlgorithm>,
    #[serde(default)]
    pub analyse_videos: bool,
    /// Output folder for extracted first frames; defaults under the app directory.
    #[serde(default)]
    pub first_frame_directory: Option<PathBuf>,
    #[serde(default = "default_ffmpeg_program")]
    pub ffmpeg_program: PathBuf,
    /// Directories skipped during the tree walk, together with their children.
    #[serde(default)]
    pub excluded_directories: Vec<PathBuf>,
    /// Folder holding `catalog.db` and the `backups` folder.
    #[serde(default)]
    pub catalog_directory: Option<PathBuf>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            assets_directory: default_assets_directory(),
            catalog_batch_size: default_batch_size(),
            thumbnail_max_width: default_thumbnail_max_width(),
            thumbnail_max_height: default_thumbnail_max_height(),
            hash_algorithms: default_hash_algorithms(),
            analyse_videos: false,
            first_frame_directory: None,
            ffmpeg_program: default_ffmpeg_program(),
            excluded_directories: Vec::new(),
            catalog_directory: None,
        }
    }
}

impl CatalogSettings {
    /// Settings rooted at `assets_directory` with every other value defaulted.
    pub fn for_assets(assets_directory: impl Into<PathBuf>) -> Self {
        Self {
            assets_directory: assets_directory.into(),
            ..Self::default()
        }
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.thumbnail_max_width = clamp_thumbnail_edge(self.thumbnail_max_width);
        self.thumbnail_max_height = clamp_thumbnail_edge(self.thumbnail_max_height);
        let mut algorithms = Vec::with_capacity(self.hash_algorithms.len());
        for algorithm in self.hash_algorithms {
            if !algorithms.contains(&algorithm) {
                algorithms.push(algorithm);
            }
        }
        if algorithms.is_empty() {
            algorithms = default_hash_algorithms();
        }
        self.hash_algorithms = algorithms;
        self
    }

    /// Resolve the first-frame output folder, falling back to the app directory.
    pub fn first_frame_directory(&self) -> Result<PathBuf, ConfigError> {
        match &self.first_frame_directory {
            Some(path) => Ok(path.clone()),
            None => Ok(app_dirs::first_frames_dir()?),
        }
    }

    /// Resolve the catalog folder, falling back to the app directory.
    pub fn catalog_directory(&self) -> Result<PathBuf, ConfigError> {
        match &self.catalog_directory {
            Some(path) => Ok(path.clone()),
            None => Ok(app_dirs::catalog_dir()?),
        }
    }
}
