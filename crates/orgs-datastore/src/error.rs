//! Error types for datastore operations

use crate::path::{DatastorePath, PathError};
use std::path::PathBuf;

/// Datastore errors
#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    /// No subject stored at path
    #[error("subject not found: {0}")]
    NotFound(DatastorePath),

    /// Malformed path
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// IO error from a file backed store
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored bytes could not be decoded
    #[error("cannot decode subject {path}: {source}")]
    Decode {
        path: DatastorePath,
        #[source]
        source: serde_json::Error,
    },

    /// Value could not be encoded
    #[error("cannot encode subject {path}: {source}")]
    Encode {
        path: DatastorePath,
        #[source]
        source: serde_json::Error,
    },

    /// Backend temporarily unusable
    #[error("datastore unavailable: {0}")]
    Unavailable(String),
}

impl DatastoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Is this a missing subject
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for datastore operations
pub type DatastoreResult<T> = Result<T, DatastoreError>;
