use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::{info, warn};

use crate::config::CatalogSettings;
use crate::creation::{AssetCreationService, FfmpegFrameExtractor, FrameExtractor};
use crate::repository::Repository;
use crate::repository::store::util::normalize_folder_path;

use super::backup_phase::{RunOutcome, finish};
use super::context::SyncContext;
use super::errors::SyncError;
use super::events::{CatalogChange, CatalogReason};
use super::first_frame::extract_first_frames;
use super::folder_sync::{
    emit_for_folder, ensure_folder, prune_stale_children, remove_folder_tree, sync_assets,
};
use super::stats::SyncStats;
use super::walk::{TreeWalk, list_dir};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FolderKind {
    Tree,
    /// The first-frame output directory, visited after the normal pass.
    FirstFrames,
}

/// Walks the configured root and keeps the repository in step with disk.
///
/// One sync runs at a time: `catalog_assets` takes `&mut self`, and
/// [`catalog_in_background`] moves the whole service onto the worker thread.
pub struct CatalogAssetsService<R: Repository> {
    repository: R,
    creation: AssetCreationService,
    frames: Option<Arc<dyn FrameExtractor>>,
    root: PathBuf,
    batch_size: usize,
    first_frame_dir: Option<PathBuf>,
    excluded: Vec<PathBuf>,
}

impl<R: Repository> CatalogAssetsService<R> {
    pub fn new(
        repository: R,
        creation: AssetCreationService,
        settings: &CatalogSettings,
    ) -> Result<Self, SyncError> {
        let first_frame_dir = if settings.analyse_videos {
            Some(normalize_folder_path(&settings.first_frame_directory()?))
        } else {
            None
        };
        let frames = first_frame_dir.as_ref().map(|_| {
            Arc::new(FfmpegFrameExtractor::new(settings.ffmpeg_program.clone()))
                as Arc<dyn FrameExtractor>
        });
        Ok(Self {
            repository,
            creation,
            frames,
            root: normalize_folder_path(&settings.assets_directory),
            batch_size: settings.catalog_batch_size,
            first_frame_dir,
            excluded: settings
                .excluded_directories
                .iter()
                .map(|path| normalize_folder_path(path))
                .collect(),
        })
    }

    /// Replace the frame extractor used when video analysis is enabled.
    pub fn with_frame_extractor(mut self, extractor: Arc<dyn FrameExtractor>) -> Self {
        self.frames = Some(extractor);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn into_repository(self) -> R {
        self.repository
    }

    /// Run one sync pass.
    ///
    /// Events reach `on_change` in order on the calling thread. Setting
    /// `cancel` stops the pass before the next folder or asset; a cancelled
    /// pass returns `Ok` with `cancelled` set and leaves the catalog unsaved.
    pub fn catalog_assets<'a>(
        &mut self,
        on_change: Option<&'a mut (dyn FnMut(&CatalogChange) + 'a)>,
        cancel: Option<&'a AtomicBool>,
    ) -> Result<SyncStats, SyncError> {
        let mut ctx = SyncContext::new(on_change, cancel, self.batch_size);
        info!(
            root = %self.root.display(),
            batch_size = self.batch_size,
            "Sync started"
        );

        let outcome = if self.batch_size == 0 || ctx.is_cancelled() {
            self.inspect_root_only(&mut ctx);
            RunOutcome::DryRun
        } else {
            let root = self.root.clone();
            if root.is_dir() {
                self.walk(&mut ctx, &root);
                if let Some(frame_dir) = self.first_frame_dir.clone()
                    && !ctx.should_stop()
                {
                    self.visit_first_frames(&mut ctx, &frame_dir);
                }
            } else {
                info!(root = %root.display(), "Root is missing or not a directory");
                remove_folder_tree(&mut self.repository, &mut ctx, &root);
            }
            RunOutcome::Walked
        };

        finish(&mut self.repository, &mut ctx, outcome)?;
        Ok(ctx.stats)
    }

    fn inspect_root_only(&mut self, ctx: &mut SyncContext<'_>) {
        let folder = if self.root.is_dir() {
            Some(ensure_folder(&mut self.repository, ctx, &self.root, false))
        } else {
            self.repository.folder_by_path(&self.root)
        };
        let change = CatalogChange::new(
            CatalogReason::FolderInspected,
            format!("Folder {} inspected", self.root.display()),
        );
        match folder {
            Some(folder) => emit_for_folder(&self.repository, ctx, &folder, change),
            None => ctx.emit(change),
        }
    }

    fn walk(&mut self, ctx: &mut SyncContext<'_>, root: &Path) {
        let first_frame_dir = self.first_frame_dir.clone();
        let excluded = self.excluded.clone();
        let mut walk = TreeWalk::new(root, move |path: &Path| {
            first_frame_dir.as_deref() == Some(path) || is_under_any(path, &excluded)
        });
        ctx.folders_found = 1;
        while let Some(dir) = walk.next_dir() {
            if ctx.should_stop() {
                break;
            }
            let subdirs = self.visit_folder(ctx, &dir, FolderKind::Tree);
            ctx.folders_found += subdirs.len();
            walk.push_children(&subdirs);
        }
    }

    fn visit_first_frames(&mut self, ctx: &mut SyncContext<'_>, frame_dir: &Path) {
        if frame_dir.is_dir() {
            ctx.folders_found += 1;
            self.visit_folder(ctx, frame_dir, FolderKind::FirstFrames);
        } else if self.repository.folder_by_path(frame_dir).is_some() {
            remove_folder_tree(&mut self.repository, ctx, frame_dir);
        }
    }

    /// Synchronize one folder and return its subdirectories.
    fn visit_folder(
        &mut self,
        ctx: &mut SyncContext<'_>,
        path: &Path,
        kind: FolderKind,
    ) -> Vec<PathBuf> {
        let folder = ensure_folder(&mut self.repository, ctx, path, true);
        let change = CatalogChange::new(
            CatalogReason::FolderInspecting,
            format!(
                "Inspecting folder {} ({} folder(s) found)",
                path.display(),
                ctx.folders_found
            ),
        );
        emit_for_folder(&self.repository, ctx, &folder, change);

        let subdirs = match list_dir(path) {
            Ok(listing) => {
                let excluded = &self.excluded;
                let frame_dir = self.first_frame_dir.as_deref();
                prune_stale_children(
                    &mut self.repository,
                    ctx,
                    path,
                    &listing.subdirs,
                    |child: &Path| {
                        is_under_any(child, excluded)
                            && !frame_dir.is_some_and(|frames| frames.starts_with(child))
                    },
                );
                sync_assets(
                    &mut self.repository,
                    &self.creation,
                    ctx,
                    &folder,
                    &listing.images,
                );
                if kind != FolderKind::FirstFrames
                    && let (Some(extractor), Some(frame_dir)) =
                        (self.frames.as_deref(), self.first_frame_dir.as_deref())
                {
                    extract_first_frames(
                        &self.repository,
                        extractor,
                        ctx,
                        &folder,
                        &listing.videos,
                        frame_dir,
                    );
                }
                if kind == FolderKind::FirstFrames {
                    Vec::new()
                } else {
                    listing.subdirs
                }
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Folder sync failed");
                ctx.record_folder_failure();
                let change = CatalogChange::new(
                    CatalogReason::FolderFailed,
                    format!("Folder {} could not be read: {err}", path.display()),
                )
                .with_error(err);
                emit_for_folder(&self.repository, ctx, &folder, change);
                Vec::new()
            }
        };

        ctx.stats.folders_inspected += 1;
        let change = CatalogChange::new(
            CatalogReason::FolderInspected,
            format!("Folder {} inspected", path.display()),
        );
        emit_for_folder(&self.repository, ctx, &folder, change);
        subdirs
    }
}

/// True when `path` is one of `dirs` or lives below one of them.
fn is_under_any(path: &Path, dirs: &[PathBuf]) -> bool {
    dirs.iter().any(|dir| path.starts_with(dir))
}

/// A sync pass running on a worker thread.
///
/// The service moves onto the thread and comes back from [`BackgroundSync::join`],
/// so a second pass cannot start until the first one has been joined.
pub struct BackgroundSync<R: Repository> {
    handle: thread::JoinHandle<(CatalogAssetsService<R>, Result<SyncStats, SyncError>)>,
    cancel: Arc<AtomicBool>,
}

impl<R: Repository> BackgroundSync<R> {
    /// Ask the worker to stop before the next folder or asset.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Wait for the pass and take the service back.
    ///
    /// The service is lost only when the worker panicked.
    pub fn join(self) -> (Option<CatalogAssetsService<R>>, Result<SyncStats, SyncError>) {
        match self.handle.join() {
            Ok((service, result)) => (Some(service), result),
            Err(_) => {
                warn!("Sync worker thread panicked");
                (None, Err(SyncError::WorkerPanicked))
            }
        }
    }
}

/// Start one sync pass on a worker thread, delivering events to `on_change`
/// from that thread in emission order.
pub fn catalog_in_background<R, F>(
    mut service: CatalogAssetsService<R>,
    mut on_change: F,
    cancel: Arc<AtomicBool>,
) -> BackgroundSync<R>
where
    R: Repository + Send + 'static,
    F: FnMut(&CatalogChange) + Send + 'static,
{
    let flag = Arc::clone(&cancel);
    let handle = thread::spawn(move || {
        let result = service.catalog_assets(Some(&mut on_change), Some(flag.as_ref()));
        (service, result)
    });
    BackgroundSync { handle, cancel }
}
