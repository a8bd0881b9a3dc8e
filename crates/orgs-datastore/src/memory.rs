//! In-memory datastore

use crate::error::{DatastoreError, DatastoreResult};
use crate::path::DatastorePath;
use crate::store::Datastore;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

/// Datastore kept in an ordered map
///
/// Suitable for tests and single-process deployments. Clones of the
/// [`std::sync::Arc`] holding it share the same keyspace, which is how
/// tests simulate peer instances writing to one backend.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    subjects: RwLock<BTreeMap<DatastorePath, Vec<u8>>>,
}

impl MemoryDatastore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored subjects
    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.read().len()
    }

    /// Check if store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.read().is_empty()
    }
}

impl Datastore for MemoryDatastore {
    fn get_subject(&self, path: &DatastorePath) -> DatastoreResult<Vec<u8>> {
        self.subjects
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| DatastoreError::NotFound(path.clone()))
    }

    fn set_subject(&self, path: &DatastorePath, data: &[u8]) -> DatastoreResult<()> {
        self.subjects.write().insert(path.clone(), data.to_vec());
        Ok(())
    }

    fn list_children(&self, path: &DatastorePath) -> DatastoreResult<Vec<DatastorePath>> {
        let subjects = self.subjects.read();
        let children: BTreeSet<DatastorePath> = subjects
            .keys()
            .filter_map(|key| path.child_towards(key))
            .collect();
        Ok(children.into_iter().collect())
    }
}
