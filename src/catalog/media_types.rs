use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jfif", "png", "gif", "bmp", "tif", "tiff", "webp", "ico",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "avi", "mkv", "webm", "wmv", "flv", "3gp", "mpg", "mpeg",
];

/// Extension used for frames extracted from videos.
pub const FIRST_FRAME_EXTENSION: &str = "jpg";

/// Return true if the path has an extension the catalog decodes as an image.
pub fn is_supported_image(path: &Path) -> bool {
    has_extension_in(path, IMAGE_EXTENSIONS)
}

/// Return true if the path looks like a video whose first frame can be catalogued.
pub fn is_supported_video(path: &Path) -> bool {
    has_extension_in(path, VIDEO_EXTENSIONS)
}

fn has_extension_in(path: &Path, extensions: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
}
