//! Catalog domain types shared by the repository, creation and sync layers.

mod asset;
mod fingerprint;
mod folder;
mod media_types;

pub use asset::{Asset, AssetHashes, Dimensions, MetadataFlag, Rotation};
pub use fingerprint::{FileFacts, facts_from_metadata, is_same_fingerprint, read_facts};
pub use folder::{Folder, FolderId};
pub use media_types::{FIRST_FRAME_EXTENSION, is_supported_image, is_supported_video};
