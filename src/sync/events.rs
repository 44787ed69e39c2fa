use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::catalog::{Asset, Folder};

/// Why a [`CatalogChange`] was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogReason {
    FolderInspecting,
    FolderInspected,
    FolderAdded,
    FolderDeleted,
    /// Enumerating a folder failed; the event carries the error.
    FolderFailed,
    AssetCreated,
    /// A file could not be decoded or read; the event carries the error.
    AssetNotCreated,
    AssetUpdated,
    AssetDeleted,
    BackupCreated,
    BackupUpdated,
    BackupNoChanges,
    SyncEnded,
}

/// Cause of an `AssetDeleted` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The file disappeared from a folder that still exists.
    FileRemoved,
    /// The whole folder disappeared.
    FolderRemoved,
}

/// Snapshot handed to the sync listener. Never stored.
#[derive(Clone)]
pub struct CatalogChange {
    pub reason: CatalogReason,
    pub asset: Option<Asset>,
    pub folder: Option<Folder>,
    /// Assets catalogued in the affected folder at emission time.
    pub cataloged_assets: Vec<Asset>,
    pub message: String,
    pub removal: Option<Removal>,
    pub error: Option<Arc<dyn Error + Send + Sync>>,
}

impl CatalogChange {
    pub(crate) fn new(reason: CatalogReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            asset: None,
            folder: None,
            cataloged_assets: Vec::new(),
            message: message.into(),
            removal: None,
            error: None,
        }
    }

    pub(crate) fn with_folder(mut self, folder: Option<Folder>, cataloged: Vec<Asset>) -> Self {
        self.folder = folder;
        self.cataloged_assets = cataloged;
        self
    }

    pub(crate) fn with_asset(mut self, asset: Asset) -> Self {
        self.asset = Some(asset);
        self
    }

    pub(crate) fn with_removal(mut self, removal: Removal) -> Self {
        self.removal = Some(removal);
        self
    }

    pub(crate) fn with_error(mut self, error: impl Error + Send + Sync + 'static) -> Self {
        self.error = Some(Arc::new(error));
        self
    }
}

impl fmt::Debug for CatalogChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogChange")
            .field("reason", &self.reason)
            .field("asset", &self.asset.as_ref().map(|asset| &asset.file_name))
            .field("folder", &self.folder.as_ref().map(|folder| &folder.path))
            .field("cataloged_assets", &self.cataloged_assets.len())
            .field("message", &self.message)
            .field("removal", &self.removal)
            .field("error", &self.error.as_ref().map(|err| err.to_string()))
            .finish()
    }
}

/// Ordered, single-threaded delivery of events to an optional listener.
pub(crate) struct EventSink<'a> {
    listener: Option<&'a mut (dyn FnMut(&CatalogChange) + 'a)>,
}

impl<'a> EventSink<'a> {
    pub(crate) fn new(listener: Option<&'a mut (dyn FnMut(&CatalogChange) + 'a)>) -> Self {
        Self { listener }
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    pub(crate) fn emit(&mut self, change: CatalogChange) {
        tracing::trace!(reason = ?change.reason, message = %change.message, "Catalog change");
        if let Some(listener) = self.listener.as_mut() {
            listener(&change);
        }
    }
}
