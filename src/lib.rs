//! Photo catalog sync engine: folder walk, asset creation, SQLite index and dated backups.
/// Application directory helpers.
pub mod app_dirs;
/// Catalog domain types.
pub mod catalog;
/// TOML configuration.
pub mod config;
/// Asset metadata, thumbnails, hashes and video frames.
pub mod creation;
/// Tracing setup.
pub mod logging;
/// Repository port and its SQLite adapter.
pub mod repository;
/// The sync state machine.
pub mod sync;
