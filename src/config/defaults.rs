use std::path::PathBuf;

use directories::UserDirs;

use super::types::HashAlgorithm;

pub(super) const MIN_THUMBNAIL_EDGE: u32 = 1;
pub(super) const MAX_THUMBNAIL_EDGE: u32 = 4_096;

pub(super) fn default_assets_directory() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.picture_dir().map(|path| path.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub(super) fn default_batch_size() -> usize {
    10_000
}

pub(super) fn default_thumbnail_max_width() -> u32 {
    200
}

pub(super) fn default_thumbnail_max_height() -> u32 {
    150
}

pub(super) fn default_hash_algorithms() -> Vec<HashAlgorithm> {
    vec![HashAlgorithm::Content]
}

pub(super) fn default_ffmpeg_program() -> PathBuf {
    PathBuf::from("ffmpeg")
}

pub(super) fn clamp_thumbnail_edge(value: u32) -> u32 {
    value.clamp(MIN_THUMBNAIL_EDGE, MAX_THUMBNAIL_EDGE)
}
