//! Folder-by-folder synchronization of the catalog with the assets tree.
//!
//! A pass walks the root depth-first, diffs every folder against the
//! repository, creates, updates and deletes assets within the batch budget,
//! optionally extracts first frames of videos, then persists the catalog and
//! refreshes today's backup. Progress is reported through [`CatalogChange`]
//! events delivered in order to a single listener.

mod backup_phase;
mod context;
mod diff;
mod errors;
mod events;
mod first_frame;
mod folder_sync;
mod service;
mod stats;
mod walk;


pub use errors::SyncError;
pub use events::{CatalogChange, CatalogReason, Removal};
pub use service::{BackgroundSync, CatalogAssetsService, catalog_in_background};
pub use stats::SyncStats;
