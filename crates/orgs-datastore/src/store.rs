//! Datastore trait and typed helpers

use crate::error::{DatastoreError, DatastoreResult};
use crate::path::DatastorePath;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Hierarchical key-value store
///
/// Subjects are opaque byte blobs addressed by [`DatastorePath`]. Calls may
/// block; callers inherit whatever latency the backend has.
pub trait Datastore: Send + Sync + Debug {
    /// Read the subject stored at `path`
    ///
    /// # Errors
    /// [`DatastoreError::NotFound`] if nothing is stored there
    fn get_subject(&self, path: &DatastorePath) -> DatastoreResult<Vec<u8>>;

    /// Store `data` at `path`, replacing any previous subject
    ///
    /// # Errors
    /// Backend specific write failures
    fn set_subject(&self, path: &DatastorePath, data: &[u8]) -> DatastoreResult<()>;

    /// Immediate children of `path`, sorted
    ///
    /// A path with nothing below it has no children; that is not an error.
    ///
    /// # Errors
    /// Backend specific enumeration failures
    fn list_children(&self, path: &DatastorePath) -> DatastoreResult<Vec<DatastorePath>>;
}

/// Read and JSON-decode the subject at `path`
///
/// # Errors
/// Propagates read errors; [`DatastoreError::Decode`] for malformed content
pub fn get_json<T: DeserializeOwned>(
    store: &dyn Datastore,
    path: &DatastorePath,
) -> DatastoreResult<T> {
    let bytes = store.get_subject(path)?;
    serde_json::from_slice(&bytes).map_err(|source| DatastoreError::Decode {
        path: path.clone(),
        source,
    })
}

/// JSON-encode `value` and store it at `path`
///
/// # Errors
/// [`DatastoreError::Encode`] if encoding fails, otherwise write errors
pub fn set_json<T: Serialize>(
    store: &dyn Datastore,
    path: &DatastorePath,
    value: &T,
) -> DatastoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| DatastoreError::Encode {
        path: path.clone(),
        source,
    })?;
    store.set_subject(path, &bytes)
}
