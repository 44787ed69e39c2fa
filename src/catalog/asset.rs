use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{Folder, FolderId};

/// Pixel dimensions of a bitmap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Clockwise rotation that must be applied to display the image upright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Clockwise180 => 180,
            Rotation::Clockwise270 => 270,
        }
    }

    /// Map a stored degree value back to a rotation; unknown values are upright.
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Clockwise90,
            180 => Rotation::Clockwise180,
            270 => Rotation::Clockwise270,
            _ => Rotation::None,
        }
    }
}

/// Hash values recorded for an asset. At least one is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHashes {
    pub content: Option<String>,
    pub difference: Option<String>,
    pub perceptual: Option<String>,
}

/// Boolean metadata flag with an optional diagnostic message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFlag {
    pub is_set: bool,
    pub message: Option<String>,
}

impl MetadataFlag {
    pub fn set(message: impl Into<String>) -> Self {
        Self {
            is_set: true,
            message: Some(message.into()),
        }
    }
}

/// Catalogued metadata for one image file (never the file bytes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub folder_id: FolderId,
    /// Folder value at the time the asset was catalogued.
    pub folder: Folder,
    pub file_name: String,
    pub file_size: u64,
    /// Creation timestamp in epoch nanoseconds; falls back to modification time.
    pub created_ns: i64,
    /// Last modified timestamp in epoch nanoseconds.
    pub modified_ns: i64,
    pub pixels: Dimensions,
    pub thumbnail_pixels: Dimensions,
    pub rotation: Rotation,
    pub hashes: AssetHashes,
    pub corrupted: MetadataFlag,
    pub rotated: MetadataFlag,
    /// Epoch seconds when the thumbnail was generated.
    pub thumbnail_created_at: i64,
}

impl Asset {
    /// Absolute path of the underlying file.
    pub fn full_path(&self) -> PathBuf {
        self.folder.path.join(&self.file_name)
    }
}
