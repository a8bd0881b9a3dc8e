//! Error types for the org manager
//!
//! Provides error handling for:
//! - Lookups of unknown orgs and nonces
//! - Org creation (id collisions, invalid ids)
//! - Service start failures
//! - Persistence failures after an org already went live
//! - Reconciliation against the datastore

use orgs_datastore::DatastoreError;
use orgs_types::{IdError, OrgId};

/// Main org manager error type
#[derive(Debug, thiserror::Error)]
pub enum OrgError {
    /// Unknown org id or nonce
    #[error("org not found: {0}")]
    NotFound(String),

    /// Org id already in use
    #[error("org id already exists: {0}")]
    AlreadyExists(OrgId),

    /// Requested org id is unusable
    #[error("invalid org id: {0}")]
    InvalidOrgId(#[from] IdError),

    /// Services for the org could not be started; nothing was registered
    #[error("failed to start org {org_id}: {source}")]
    StartFailed {
        org_id: OrgId,
        #[source]
        source: ServiceError,
    },

    /// Org is live in memory but its record was not persisted
    #[error("org {org_id} is running but its record was not persisted: {source}")]
    PersistFailed {
        org_id: OrgId,
        #[source]
        source: DatastoreError,
    },

    /// Org records could not be enumerated
    #[error("cannot list org records: {0}")]
    ScanFailed(#[source] DatastoreError),

    /// Datastore failed before anything was started
    #[error("datastore error: {0}")]
    Datastore(#[from] DatastoreError),

    /// Operation needs durable storage but none is configured
    #[error("no datastore configured")]
    DatastoreNotConfigured,

    /// Root org looked up before startup completed
    #[error("root org has not been started")]
    RootOrgNotStarted,

    /// Global locator queried before registration
    #[error("no org manager registered")]
    ManagerNotRegistered,
}

impl OrgError {
    /// Check if error is a missing org or nonce
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if the operation left state behind despite failing
    ///
    /// True only for [`OrgError::PersistFailed`]: the org is running but
    /// will neither survive a restart nor be seen by peers.
    #[inline]
    #[must_use]
    pub fn is_partial_failure(&self) -> bool {
        matches!(self, Self::PersistFailed { .. })
    }
}

/// Service container errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A service in the bundle refused to start
    #[error("service '{service}' failed to start: {reason}")]
    StartFailed { service: String, reason: String },
}

impl ServiceError {
    /// Create start failure for a named service
    pub fn start_failed(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StartFailed {
            service: service.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for org manager operations
pub type OrgResult<T> = Result<T, OrgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_error_display() {
        let err = OrgError::NotFound("O1".to_string());
        assert_eq!(err.to_string(), "org not found: O1");
        assert!(err.is_not_found());
    }

    #[test]
    fn persist_failed_is_partial() {
        let err = OrgError::PersistFailed {
            org_id: OrgId::parse("O1").unwrap(),
            source: DatastoreError::Unavailable("down".into()),
        };
        assert!(err.is_partial_failure());
        assert!(err.to_string().contains("not persisted"));
        assert!(!OrgError::DatastoreNotConfigured.is_partial_failure());
    }

    #[test]
    fn start_failed_carries_source() {
        let err = OrgError::StartFailed {
            org_id: OrgId::parse("O1").unwrap(),
            source: ServiceError::start_failed("frontend", "port in use"),
        };
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "service 'frontend' failed to start: port in use");
    }

    #[test]
    fn id_error_converts() {
        let err: OrgError = IdError::Reserved("root".into()).into();
        assert!(matches!(err, OrgError::InvalidOrgId(_)));
    }
}
