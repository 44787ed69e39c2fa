use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use thiserror::Error;

use crate::catalog::{Dimensions, MetadataFlag, Rotation};

/// Decoded image facts plus an encoded thumbnail.
#[derive(Debug, Clone)]
pub struct ExtractedMetadata {
    /// Upright dimensions, after the stored orientation is applied.
    pub pixels: Dimensions,
    pub rotation: Rotation,
    pub rotated: MetadataFlag,
    pub thumbnail_pixels: Dimensions,
    /// JPEG-encoded thumbnail.
    pub thumbnail: Vec<u8>,
    /// Upright bitmap, handed to the hash calculator.
    pub image: DynamicImage,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Image {path} could not be decoded: {message}")]
    Corrupted { path: PathBuf, message: String },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode thumbnail for {path}: {message}")]
    Thumbnail { path: PathBuf, message: String },
}

/// Reads pixel dimensions, orientation and a thumbnail from an image file.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<ExtractedMetadata, MetadataError>;
}

/// Extractor built on the `image` crate decoders.
#[derive(Debug, Clone, Copy)]
pub struct ImageMetadataExtractor {
    max_width: u32,
    max_height: u32,
}

impl ImageMetadataExtractor {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: max_width.max(1),
            max_height: max_height.max(1),
        }
    }
}

impl MetadataExtractor for ImageMetadataExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedMetadata, MetadataError> {
        let corrupted = |err: image::ImageError| MetadataError::Corrupted {
            path: path.to_path_buf(),
            message: err.to_string(),
        };
        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| MetadataError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let mut decoder = reader.into_decoder().map_err(corrupted)?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut image = DynamicImage::from_decoder(decoder).map_err(corrupted)?;
        image.apply_orientation(orientation);

        let (rotation, rotated) = rotation_from(orientation);
        let thumbnail = image.thumbnail(self.max_width, self.max_height);
        let thumbnail_pixels = Dimensions::new(thumbnail.width(), thumbnail.height());
        let encoded = encode_jpeg(&thumbnail).map_err(|err| MetadataError::Thumbnail {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        Ok(ExtractedMetadata {
            pixels: Dimensions::new(image.width(), image.height()),
            rotation,
            rotated,
            thumbnail_pixels,
            thumbnail: encoded,
            image,
        })
    }
}

fn rotation_from(orientation: Orientation) -> (Rotation, MetadataFlag) {
    let rotation = match orientation {
        Orientation::Rotate90 | Orientation::Rotate90FlipH => Rotation::Clockwise90,
        Orientation::Rotate180 | Orientation::FlipVertical => Rotation::Clockwise180,
        Orientation::Rotate270 | Orientation::Rotate270FlipH => Rotation::Clockwise270,
        Orientation::NoTransforms | Orientation::FlipHorizontal => Rotation::None,
    };
    let flag = if orientation == Orientation::NoTransforms {
        MetadataFlag::default()
    } else {
        MetadataFlag::set(format!("EXIF orientation {}", orientation.to_exif()))
    };
    (rotation, flag)
}

fn encode_jpeg(image: &DynamicImage) -> image::ImageResult<Vec<u8>> {
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)?;
    Ok(out)
}
