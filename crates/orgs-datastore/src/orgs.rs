//! Where org records live in the keyspace

use crate::path::{DatastorePath, PathError};
use orgs_types::OrgId;

/// First segment of every org record path
pub const ORGS_ROOT_SEGMENT: &str = "orgs";

/// Root below which every org record is stored (`/orgs`)
#[must_use]
pub fn orgs_root() -> DatastorePath {
    DatastorePath::single_unchecked(ORGS_ROOT_SEGMENT)
}

/// Maps an org id to its record path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgPathManager {
    org_id: OrgId,
}

impl OrgPathManager {
    /// Path manager for `org_id`
    #[inline]
    #[must_use]
    pub fn new(org_id: OrgId) -> Self {
        Self { org_id }
    }

    /// Record path, `/orgs/<org_id>`
    ///
    /// # Errors
    /// The root org has no record path; ids that are not a single path
    /// component are rejected
    pub fn path(&self) -> Result<DatastorePath, PathError> {
        orgs_root().child(self.org_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_path() {
        let path = OrgPathManager::new(OrgId::parse("O1").unwrap()).path().unwrap();
        assert_eq!(path.to_string(), "/orgs/O1");
        assert!(orgs_root().is_ancestor_of(&path));
    }

    #[test]
    fn root_org_has_no_record_path() {
        let result = OrgPathManager::new(OrgId::root()).path();
        assert_eq!(result, Err(PathError::EmptySegment));
    }

    #[test]
    fn lookup_ids_are_validated() {
        let result = OrgPathManager::new(OrgId::lookup("../etc")).path();
        assert!(matches!(result, Err(PathError::InvalidSegment(_))));
    }
}
