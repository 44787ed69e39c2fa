use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::catalog::{FIRST_FRAME_EXTENSION, Folder};
use crate::creation::FrameExtractor;
use crate::repository::Repository;

use super::context::SyncContext;
use super::events::{CatalogChange, CatalogReason};
use super::folder_sync::emit_for_folder;

/// Where the first frame of `video` is written: `<frame_dir>/<stem>.jpg`.
///
/// Videos sharing a stem map to the same frame file.
pub(super) fn frame_path(frame_dir: &Path, video: &Path) -> Option<PathBuf> {
    let stem = video.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(FIRST_FRAME_EXTENSION);
    Some(frame_dir.join(name))
}

/// Extract the first frame of every video whose frame file does not exist yet.
///
/// Existing frames are never refreshed, so a modified video keeps its old frame.
pub(super) fn extract_first_frames<R: Repository>(
    repository: &R,
    extractor: &dyn FrameExtractor,
    ctx: &mut SyncContext<'_>,
    folder: &Folder,
    videos: &[PathBuf],
    frame_dir: &Path,
) {
    for video in videos {
        if ctx.is_cancelled() {
            return;
        }
        let Some(output) = frame_path(frame_dir, video) else {
            continue;
        };
        if output.exists() {
            continue;
        }
        match extractor.extract_first_frame(video, &output) {
            Ok(()) => {
                ctx.stats.frames_extracted += 1;
                debug!(
                    video = %video.display(),
                    frame = %output.display(),
                    "First frame extracted"
                );
            }
            Err(err) => {
                warn!(video = %video.display(), error = %err, "First frame extraction failed");
                ctx.stats.not_created += 1;
                let change = CatalogChange::new(
                    CatalogReason::AssetNotCreated,
                    format!(
                        "First frame of {} could not be extracted: {err}",
                        video.display()
                    ),
                )
                .with_error(err);
                emit_for_folder(repository, ctx, folder, change);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_path_uses_video_stem_with_image_extension() {
        let dir = Path::new("/frames");
        assert_eq!(
            frame_path(dir, Path::new("/videos/trip.mov")),
            Some(PathBuf::from("/frames/trip.jpg"))
        );
        assert_eq!(
            frame_path(dir, Path::new("/videos/a/trip.mp4")),
            frame_path(dir, Path::new("/videos/b/trip.mkv"))
        );
    }
}
