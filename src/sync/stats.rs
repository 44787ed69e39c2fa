/// Summary of one sync pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncStats {
    pub folders_inspected: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub not_created: usize,
    pub folders_added: usize,
    pub folders_deleted: usize,
    pub frames_extracted: usize,
    pub failed_folders: usize,
    /// True when the pass stopped early because cancellation was requested.
    pub cancelled: bool,
    /// True when the batch budget ran out and work was deferred to the next pass.
    pub deferred: bool,
    /// True when the catalog was written to storage.
    pub saved: bool,
}

impl SyncStats {
    /// Number of assets created, updated or deleted.
    pub fn changed_assets(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}
