//! Org Datastore
//!
//! Hierarchical key-value persistence consumed by the org manager.
//!
//! # Core Concepts
//!
//! - [`Datastore`]: get / set / list-children over [`DatastorePath`]s
//! - [`MemoryDatastore`]: ordered in-memory map
//! - [`FileDatastore`]: one JSON file per subject under a root directory
//! - [`OrgPathManager`]: where each org record lives (`/orgs/<org_id>`)
//!
//! ```text
//! /orgs
//!   ├── O01j...a   → {"org_id": "O01j...a", "name": "Acme", "nonce": "..."}
//!   └── O01j...b   → {"org_id": "O01j...b", "name": "Initech", "nonce": "..."}
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod error;
mod file;
mod memory;
mod orgs;
mod path;
mod store;

// Re-exports
pub use error::{DatastoreError, DatastoreResult};
pub use file::FileDatastore;
pub use memory::MemoryDatastore;
pub use orgs::{orgs_root, OrgPathManager, ORGS_ROOT_SEGMENT};
pub use path::{DatastorePath, PathError};
pub use store::{get_json, set_json, Datastore};

use orgs_types::DatastoreConfig;
use std::sync::Arc;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Open the backend described by a datastore config section
///
/// `Memory` selects [`MemoryDatastore`]; anything else is file backed at
/// `location`.
///
/// # Errors
/// [`DatastoreError::Unavailable`] when a file backend has no location
pub fn open(config: &DatastoreConfig) -> DatastoreResult<Arc<dyn Datastore>> {
    if config.is_memory() {
        tracing::info!("using in-memory datastore");
        return Ok(Arc::new(MemoryDatastore::new()));
    }
    if config.location.is_empty() {
        return Err(DatastoreError::Unavailable(format!(
            "datastore '{}' has no location",
            config.implementation
        )));
    }
    tracing::info!(location = %config.location, "using file datastore");
    Ok(Arc::new(FileDatastore::new(&config.location)))
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn open_memory() {
        let config = DatastoreConfig {
            implementation: "Memory".into(),
            ..DatastoreConfig::default()
        };
        let store = open(&config).unwrap();
        assert!(store.list_children(&orgs_root()).unwrap().is_empty());
    }

    #[test]
    fn open_file_requires_location() {
        let config = DatastoreConfig {
            implementation: "FileBaseDataStore".into(),
            ..DatastoreConfig::default()
        };
        assert!(matches!(open(&config), Err(DatastoreError::Unavailable(_))));
    }

    #[test]
    fn open_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatastoreConfig {
            implementation: "FileBaseDataStore".into(),
            location: dir.path().to_string_lossy().into_owned(),
            ..DatastoreConfig::default()
        };
        let store = open(&config).unwrap();
        let path = orgs_root().child("O1").unwrap();
        store.set_subject(&path, b"{}").unwrap();
        assert!(dir.path().join("orgs").join("O1.json").exists());
    }
}
