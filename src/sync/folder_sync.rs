use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::catalog::Folder;
use crate::creation::{AssetCreationService, CreatedAsset};
use crate::repository::Repository;

use super::context::SyncContext;
use super::diff::{PendingAsset, diff_folder};
use super::events::{CatalogChange, CatalogReason, Removal};
use super::walk::DiskFile;

/// Emit `change` with the folder and its current catalogue attached.
pub(super) fn emit_for_folder<R: Repository>(
    repository: &R,
    ctx: &mut SyncContext<'_>,
    folder: &Folder,
    change: CatalogChange,
) {
    let cataloged = if ctx.events.is_listening() {
        repository.cataloged_assets_by_path(&folder.path)
    } else {
        Vec::new()
    };
    ctx.emit(change.with_folder(Some(folder.clone()), cataloged));
}

/// Return the folder record for `path`, creating it when unknown.
///
/// New folders are announced with `FolderAdded` unless `announce` is false.
pub(super) fn ensure_folder<R: Repository>(
    repository: &mut R,
    ctx: &mut SyncContext<'_>,
    path: &Path,
    announce: bool,
) -> Folder {
    if let Some(folder) = repository.folder_by_path(path) {
        return folder;
    }
    let folder = repository.add_folder(path);
    ctx.stats.folders_added += 1;
    debug!(path = %path.display(), "Folder added to catalog");
    if announce {
        let change = CatalogChange::new(
            CatalogReason::FolderAdded,
            format!("Folder {} added to catalog", path.display()),
        );
        emit_for_folder(repository, ctx, &folder, change);
    }
    folder
}

/// Apply deletions, then create or update changed files within the batch budget.
pub(super) fn sync_assets<R: Repository>(
    repository: &mut R,
    creation: &AssetCreationService,
    ctx: &mut SyncContext<'_>,
    folder: &Folder,
    images: &[DiskFile],
) {
    let diff = diff_folder(repository.cataloged_assets_by_path(&folder.path), images);

    for asset in diff.deleted {
        let Some(removed) = repository.delete_asset(folder, &asset.file_name) else {
            continue;
        };
        ctx.stats.deleted += 1;
        let path = removed.full_path();
        debug!(path = %path.display(), "Asset file removed");
        let change = CatalogChange::new(
            CatalogReason::AssetDeleted,
            format!("Asset {} deleted", path.display()),
        )
        .with_asset(removed)
        .with_removal(Removal::FileRemoved);
        emit_for_folder(repository, ctx, folder, change);
    }

    for pending in diff.pending {
        if ctx.is_cancelled() {
            return;
        }
        if ctx.budget_exhausted() {
            ctx.defer();
            return;
        }
        create_or_update(repository, creation, ctx, folder, pending);
    }
}

fn create_or_update<R: Repository>(
    repository: &mut R,
    creation: &AssetCreationService,
    ctx: &mut SyncContext<'_>,
    folder: &Folder,
    pending: PendingAsset,
) {
    let path = &pending.file.path;
    match creation.create_asset(path, folder) {
        Ok(CreatedAsset { asset, thumbnail }) => {
            ctx.consume_budget();
            let change = if pending.is_update() {
                repository.update_asset(asset.clone(), Some(thumbnail));
                ctx.stats.updated += 1;
                debug!(path = %path.display(), "Asset updated");
                CatalogChange::new(
                    CatalogReason::AssetUpdated,
                    format!("Asset {} updated", path.display()),
                )
            } else {
                repository.add_asset(asset.clone(), thumbnail);
                ctx.stats.created += 1;
                debug!(path = %path.display(), "Asset created");
                CatalogChange::new(
                    CatalogReason::AssetCreated,
                    format!("Asset {} created", path.display()),
                )
            };
            emit_for_folder(repository, ctx, folder, change.with_asset(asset));
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Asset not cataloged");
            ctx.stats.not_created += 1;
            let change = CatalogChange::new(
                CatalogReason::AssetNotCreated,
                format!("Asset {} could not be cataloged: {err}", path.display()),
            )
            .with_error(err);
            emit_for_folder(repository, ctx, folder, change);
        }
    }
}

/// Remove catalogued children of `parent` whose directory is gone from disk
/// or that the walk no longer enters.
pub(super) fn prune_stale_children<R: Repository>(
    repository: &mut R,
    ctx: &mut SyncContext<'_>,
    parent: &Path,
    subdirs_on_disk: &[PathBuf],
    is_excluded: impl Fn(&Path) -> bool,
) {
    let on_disk: HashSet<&Path> = subdirs_on_disk.iter().map(PathBuf::as_path).collect();
    let stale: Vec<Folder> = repository
        .folders()
        .into_iter()
        .filter(|folder| folder.is_child_of(parent))
        .filter(|folder| !on_disk.contains(folder.path.as_path()) || is_excluded(&folder.path))
        .collect();
    for folder in stale {
        remove_folder_tree(repository, ctx, &folder.path);
    }
}

/// Delete `top` and every catalogued folder below it, deepest first, emitting
/// `AssetDeleted` for each asset then `FolderDeleted` for each folder.
pub(super) fn remove_folder_tree<R: Repository>(
    repository: &mut R,
    ctx: &mut SyncContext<'_>,
    top: &Path,
) {
    let mut doomed: Vec<Folder> = repository
        .folders()
        .into_iter()
        .filter(|folder| folder.is_within(top))
        .collect();
    doomed.sort_by(|a, b| b.path.cmp(&a.path));
    for folder in doomed {
        for asset in repository.cataloged_assets_by_path(&folder.path) {
            let Some(removed) = repository.delete_asset(&folder, &asset.file_name) else {
                continue;
            };
            ctx.stats.deleted += 1;
            let change = CatalogChange::new(
                CatalogReason::AssetDeleted,
                format!(
                    "Asset {} deleted with its folder",
                    removed.full_path().display()
                ),
            )
            .with_asset(removed)
            .with_removal(Removal::FolderRemoved);
            emit_for_folder(repository, ctx, &folder, change);
        }
        repository.delete_folder(&folder);
        ctx.stats.folders_deleted += 1;
        debug!(path = %folder.path.display(), "Folder removed from catalog");
        let message = format!("Folder {} deleted", folder.path.display());
        ctx.emit(
            CatalogChange::new(CatalogReason::FolderDeleted, message)
                .with_folder(Some(folder), Vec::new()),
        );
    }
}
