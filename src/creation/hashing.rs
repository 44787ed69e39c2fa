use std::fs::File;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use image::imageops::FilterType;
use thiserror::Error;

use crate::catalog::AssetHashes;
use crate::config::HashAlgorithm;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("Failed to hash {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No hash algorithm is configured")]
    NoAlgorithm,
}

/// Computes the configured hash values for one file.
pub trait HashCalculator: Send + Sync {
    fn calculate(&self, path: &Path, image: &DynamicImage) -> Result<AssetHashes, HashError>;
}

/// Hash calculator driven by the configured algorithm set.
#[derive(Debug, Clone)]
pub struct ConfiguredHashCalculator {
    algorithms: Vec<HashAlgorithm>,
}

impl ConfiguredHashCalculator {
    pub fn new(algorithms: &[HashAlgorithm]) -> Self {
        Self {
            algorithms: algorithms.to_vec(),
        }
    }
}

impl HashCalculator for ConfiguredHashCalculator {
    fn calculate(&self, path: &Path, image: &DynamicImage) -> Result<AssetHashes, HashError> {
        if self.algorithms.is_empty() {
            return Err(HashError::NoAlgorithm);
        }
        let mut hashes = AssetHashes::default();
        for algorithm in &self.algorithms {
            match algorithm {
                HashAlgorithm::Content => hashes.content = Some(content_hash(path)?),
                HashAlgorithm::Difference => hashes.difference = Some(difference_hash(image)),
                HashAlgorithm::Perceptual => hashes.perceptual = Some(perceptual_hash(image)),
            }
        }
        Ok(hashes)
    }
}

/// Hex-encoded blake3 digest of the file bytes.
pub fn content_hash(path: &Path) -> Result<String, HashError> {
    let io_error = |source| HashError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update_reader(file).map_err(io_error)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// 64-bit gradient hash: each bit says whether a pixel is brighter than its
/// right neighbour on a 9x8 grayscale reduction.
pub fn difference_hash(image: &DynamicImage) -> String {
    let small = image.resize_exact(9, 8, FilterType::Triangle).to_luma8();
    let mut bits = 0u64;
    for y in 0..8 {
        for x in 0..8 {
            let left = small.get_pixel(x, y)[0];
            let right = small.get_pixel(x + 1, y)[0];
            bits = (bits << 1) | u64::from(left > right);
        }
    }
    format!("{bits:016x}")
}

const DCT_SIZE: usize = 32;
const DCT_KEEP: usize = 8;

/// 64-bit perceptual hash from the low frequencies of a 32x32 DCT.
pub fn perceptual_hash(image: &DynamicImage) -> String {
    let small = image
        .resize_exact(DCT_SIZE as u32, DCT_SIZE as u32, FilterType::Triangle)
        .to_luma8();
    let pixels: Vec<f64> = small.pixels().map(|p| f64::from(p[0])).collect();
    let coefficients = low_frequency_dct(&pixels);

    // The DC term carries overall brightness and is left out of the median.
    let mut sorted: Vec<f64> = coefficients[1..].to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = sorted[sorted.len() / 2];

    let mut bits = 0u64;
    for value in coefficients {
        bits = (bits << 1) | u64::from(value > median);
    }
    format!("{bits:016x}")
}

fn low_frequency_dct(pixels: &[f64]) -> Vec<f64> {
    let n = DCT_SIZE as f64;
    let mut cos_table = vec![0.0; DCT_KEEP * DCT_SIZE];
    for u in 0..DCT_KEEP {
        for x in 0..DCT_SIZE {
            cos_table[u * DCT_SIZE + x] =
                (((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI) / (2.0 * n)).cos();
        }
    }
    let mut out = Vec::with_capacity(DCT_KEEP * DCT_KEEP);
    for v in 0..DCT_KEEP {
        for u in 0..DCT_KEEP {
            let mut sum = 0.0;
            for y in 0..DCT_SIZE {
                let cy = cos_table[v * DCT_SIZE + y];
                for x in 0..DCT_SIZE {
                    sum += pixels[y * DCT_SIZE + x] * cos_table[u * DCT_SIZE + x] * cy;
                }
            }
            out.push(sum);
        }
    }
    out
}
