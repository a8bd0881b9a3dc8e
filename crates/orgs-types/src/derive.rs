//! Per-org configuration derivation
//!
//! Every org runs with its own [`Config`], built from the root config:
//!
//! - org id and name stamped in
//! - the client nonce replaced by the org's own nonce (the client section
//!   never learns the org id)
//! - storage locations moved under `orgs/<org_id>` for every non-root org
//!
//! The builder consumes a clone of the root, so the result shares nothing
//! with the root or with any other org's config.

use crate::config::Config;
use crate::ids::{Nonce, OrgId};
use crate::record::OrgRecord;
use std::path::Path;

/// Directory segment under which non-root orgs keep their storage
pub const ORGS_SUBDIR: &str = "orgs";

/// Builder for a derived org config
#[derive(Debug, Clone)]
pub struct OrgConfigBuilder {
    config: Config,
}

impl OrgConfigBuilder {
    /// Start from a copy of the root config
    #[inline]
    #[must_use]
    pub fn from_root(root: &Config) -> Self {
        Self {
            config: root.clone(),
        }
    }

    /// Stamp org id and name
    #[must_use]
    pub fn identity(mut self, org_id: &OrgId, name: &str) -> Self {
        self.config.org_id = org_id.as_str().to_string();
        self.config.org_name = name.to_string();
        self
    }

    /// Replace the client nonce, if there is a client section
    #[must_use]
    pub fn client_nonce(mut self, nonce: &Nonce) -> Self {
        if let Some(client) = self.config.client.as_mut() {
            client.nonce = nonce.as_str().to_string();
        }
        self
    }

    /// Namespace storage locations under `orgs/<org_id>`
    ///
    /// No-op for the root org and for empty locations.
    #[must_use]
    pub fn namespace_storage(mut self, org_id: &OrgId) -> Self {
        if org_id.is_root() {
            return self;
        }
        if let Some(datastore) = self.config.datastore.as_mut() {
            datastore.location = org_storage_path(&datastore.location, org_id);
            datastore.filestore_directory =
                org_storage_path(&datastore.filestore_directory, org_id);
        }
        self
    }

    /// Finish
    #[inline]
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}

/// Derive the config an org runs with
#[must_use]
pub fn derive_org_config(root: &Config, record: &OrgRecord) -> Config {
    OrgConfigBuilder::from_root(root)
        .identity(&record.org_id, &record.name)
        .client_nonce(&record.nonce)
        .namespace_storage(&record.org_id)
        .build()
}

/// Storage location of `org_id` below `base`
///
/// Empty `base` stays empty; the root org uses `base` itself.
#[must_use]
pub fn org_storage_path(base: &str, org_id: &OrgId) -> String {
    if base.is_empty() || org_id.is_root() {
        return base.to_string();
    }
    Path::new(base)
        .join(ORGS_SUBDIR)
        .join(org_id.as_str())
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, DatastoreConfig};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn root_config() -> Config {
        Config {
            client: Some(ClientConfig {
                nonce: "root-nonce".into(),
                server_urls: vec!["https://frontend:8000/".into()],
                writeback_path: "/var/lib/orgs/writeback.yaml".into(),
            }),
            datastore: Some(DatastoreConfig {
                implementation: "FileBaseDataStore".into(),
                location: "/data".into(),
                filestore_directory: "/files".into(),
            }),
            ..Config::default()
        }
    }

    fn acme() -> OrgRecord {
        OrgRecord::new(OrgId::parse("OACME").unwrap(), "Acme").with_nonce(Nonce::new("acme-nonce"))
    }

    #[test]
    fn stamps_identity() {
        let derived = derive_org_config(&root_config(), &acme());
        assert_eq!(derived.org_id, "OACME");
        assert_eq!(derived.org_name, "Acme");
    }

    #[test]
    fn substitutes_client_nonce() {
        let derived = derive_org_config(&root_config(), &acme());
        let client = derived.client.unwrap();
        assert_eq!(client.nonce, "acme-nonce");
        assert_eq!(client.server_urls, vec!["https://frontend:8000/".to_string()]);
        assert_eq!(client.writeback_path, "/var/lib/orgs/writeback.yaml");
    }

    #[test]
    fn client_section_never_carries_org_id() {
        let derived = derive_org_config(&root_config(), &acme());
        let client_yaml = serde_yaml::to_string(&derived.client).unwrap();
        assert!(!client_yaml.contains("OACME"));
    }

    #[test]
    fn namespaces_storage() {
        let derived = derive_org_config(&root_config(), &acme());
        let ds = derived.datastore.unwrap();
        assert_eq!(Path::new(&ds.location), Path::new("/data/orgs/OACME"));
        assert_eq!(Path::new(&ds.filestore_directory), Path::new("/files/orgs/OACME"));
    }

    #[test]
    fn root_org_keeps_root_storage() {
        let root = root_config();
        let record = OrgRecord::root(Nonce::new("root-nonce"));
        let derived = derive_org_config(&root, &record);
        assert_eq!(derived.datastore, root.datastore);
        assert_eq!(derived.client, root.client);
        assert_eq!(derived.org_id, "");
    }

    #[test]
    fn empty_locations_stay_empty() {
        let mut root = root_config();
        root.datastore = Some(DatastoreConfig {
            implementation: "Memory".into(),
            ..DatastoreConfig::default()
        });
        let derived = derive_org_config(&root, &acme());
        let ds = derived.datastore.unwrap();
        assert!(ds.location.is_empty());
        assert!(ds.filestore_directory.is_empty());
    }

    #[test]
    fn missing_sections_stay_missing() {
        let derived = derive_org_config(&Config::default(), &acme());
        assert!(derived.client.is_none());
        assert!(derived.datastore.is_none());
        assert_eq!(derived.org_id, "OACME");
    }

    #[test]
    fn root_is_left_untouched() {
        let root = root_config();
        let before = root.clone();
        let _ = derive_org_config(&root, &acme());
        assert_eq!(root, before);
    }

    #[test]
    fn derived_configs_are_independent() {
        let root = root_config();
        let mut a = derive_org_config(&root, &acme());
        let b = derive_org_config(&root, &acme());
        a.client.as_mut().unwrap().server_urls.push("https://other/".into());
        assert_eq!(b.client.unwrap().server_urls.len(), 1);
        assert_eq!(root.client.unwrap().server_urls.len(), 1);
    }

    proptest! {
        #[test]
        fn storage_path_is_base_orgs_id(
            base in "/[a-z]{1,8}(/[a-z]{1,8}){0,3}",
            id in "O[A-Z0-9]{4,12}",
        ) {
            let org_id = OrgId::parse(&id).unwrap();
            let derived = org_storage_path(&base, &org_id);
            prop_assert_eq!(
                Path::new(&derived).to_path_buf(),
                Path::new(&base).join("orgs").join(&id)
            );
            prop_assert_eq!(org_storage_path(&base, &OrgId::root()), base);
        }
    }
}
