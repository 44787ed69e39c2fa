use tracing::info;

use crate::repository::{Repository, today};

use super::context::SyncContext;
use super::errors::SyncError;
use super::events::{CatalogChange, CatalogReason};

/// How the run ended before persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RunOutcome {
    Walked,
    /// Batch size 0 or cancelled before the walk: nothing is written.
    DryRun,
}

/// Persist the catalog when allowed, refresh today's backup, and emit the
/// backup outcome followed by `SyncEnded`.
pub(super) fn finish<R: Repository>(
    repository: &mut R,
    ctx: &mut SyncContext<'_>,
    outcome: RunOutcome,
) -> Result<(), SyncError> {
    let skipped = if ctx.is_cancelled() {
        Some("Backup skipped, sync cancelled".to_string())
    } else if ctx.has_failures() {
        Some(format!(
            "Backup skipped, {} folder(s) failed",
            ctx.stats.failed_folders
        ))
    } else if outcome == RunOutcome::DryRun {
        Some("Backup skipped, batch size is 0".to_string())
    } else {
        None
    };

    match skipped {
        Some(message) => {
            info!(reason = %message, "Catalog not persisted");
            ctx.emit(CatalogChange::new(CatalogReason::BackupNoChanges, message));
        }
        None => persist_and_backup(repository, ctx)?,
    }

    let message = if ctx.stats.cancelled {
        "Sync cancelled".to_string()
    } else if ctx.has_failures() {
        format!(
            "Sync ended with {} failed folder(s)",
            ctx.stats.failed_folders
        )
    } else {
        "Sync completed".to_string()
    };
    info!(
        created = ctx.stats.created,
        updated = ctx.stats.updated,
        deleted = ctx.stats.deleted,
        not_created = ctx.stats.not_created,
        folders = ctx.stats.folders_inspected,
        cancelled = ctx.stats.cancelled,
        deferred = ctx.stats.deferred,
        "{message}"
    );
    ctx.emit(CatalogChange::new(CatalogReason::SyncEnded, message));
    Ok(())
}

fn persist_and_backup<R: Repository>(
    repository: &mut R,
    ctx: &mut SyncContext<'_>,
) -> Result<(), SyncError> {
    if repository.has_changes() {
        repository.save_catalog()?;
        ctx.stats.saved = true;
    }
    // One date for the whole decision, even if the pass crosses midnight.
    let date = today();
    let change = if !repository.backup_exists(date) {
        repository.write_backup(date)?;
        CatalogChange::new(CatalogReason::BackupCreated, "Backup created")
    } else if repository.backup_is_out_of_date(date) {
        repository.write_backup(date)?;
        CatalogChange::new(CatalogReason::BackupUpdated, "Backup updated")
    } else {
        CatalogChange::new(CatalogReason::BackupNoChanges, "No backup changes")
    };
    ctx.emit(change);
    Ok(())
}
