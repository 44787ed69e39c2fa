//! Catalog configuration stored as TOML under the application directory.

mod defaults;
mod errors;
mod io;
mod types;

#[cfg(test)]
mod tests;

/// Default filename used to store the catalog configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub use errors::ConfigError;
pub use io::{config_path, load_from_path, load_or_default, save, save_to_path};
pub use types::{CatalogSettings, HashAlgorithm};
