//! Persisted org descriptor

use crate::ids::{Nonce, OrgId, ROOT_ORG_NAME};
use serde::{Deserialize, Serialize};

/// Durable description of an org
///
/// Written once when the org is created and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRecord {
    /// Org identifier (empty for root)
    pub org_id: OrgId,
    /// Human readable name
    pub name: String,
    /// Client nonce mapping back to this org
    pub nonce: Nonce,
}

impl OrgRecord {
    /// New record with a freshly generated nonce
    #[must_use]
    pub fn new(org_id: OrgId, name: impl Into<String>) -> Self {
        Self {
            org_id,
            name: name.into(),
            nonce: Nonce::generate(),
        }
    }

    /// Record for the root org, carrying the root config's client nonce
    #[must_use]
    pub fn root(nonce: Nonce) -> Self {
        Self {
            org_id: OrgId::root(),
            name: ROOT_ORG_NAME.to_string(),
            nonce,
        }
    }

    /// Replace the nonce
    #[inline]
    #[must_use]
    pub fn with_nonce(mut self, nonce: Nonce) -> Self {
        self.nonce = nonce;
        self
    }

    /// Is this the root org's record
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.org_id.is_root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_record_gets_fresh_nonce() {
        let id = OrgId::generate();
        let a = OrgRecord::new(id.clone(), "Acme");
        let b = OrgRecord::new(id, "Acme");
        assert!(!a.nonce.is_empty());
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn root_record() {
        let root = OrgRecord::root(Nonce::new("abc"));
        assert!(root.is_root());
        assert_eq!(root.name, ROOT_ORG_NAME);
        assert_eq!(root.nonce.as_str(), "abc");
    }

    #[test]
    fn json_layout() {
        let record = OrgRecord::new(OrgId::parse("O1").unwrap(), "Acme").with_nonce(Nonce::new("n"));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "org_id": "O1", "name": "Acme", "nonce": "n" })
        );

        let back: OrgRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn json_missing_id_is_rejected() {
        let result: Result<OrgRecord, _> =
            serde_json::from_str(r#"{ "name": "Acme", "nonce": "n" }"#);
        assert!(result.is_err());
    }
}
