//! Org Types
//!
//! Foundation types shared by the org manager crates.
//!
//! # Core Concepts
//!
//! - [`OrgId`]: Org identifier; empty for the root org, `"root"` as lookup alias
//! - [`Nonce`]: Opaque client token mapping a client back to its org
//! - [`OrgRecord`]: Durable, immutable org descriptor
//! - [`Config`]: Owned configuration value (root or per-org)
//! - [`derive_org_config`]: Builds an org's isolated config from the root
//!
//! # Example
//!
//! ```rust
//! use orgs_types::{derive_org_config, Config, OrgId, OrgRecord};
//!
//! let root = Config::from_yaml_str("datastore:\n  location: /data\n").unwrap();
//! let record = OrgRecord::new(OrgId::generate(), "Acme");
//! let config = derive_org_config(&root, &record);
//!
//! assert_eq!(config.org_name, "Acme");
//! assert!(config.datastore.unwrap().location.starts_with("/data"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod derive;
pub mod error;
pub mod ids;
pub mod record;

// Re-exports
pub use config::{
    ClientConfig, Config, DatastoreConfig, LoggingConfig, OrgManagerConfig,
    DEFAULT_SCAN_INTERVAL_SECS,
};
pub use derive::{derive_org_config, org_storage_path, OrgConfigBuilder, ORGS_SUBDIR};
pub use error::ConfigError;
pub use ids::{IdError, Nonce, OrgId, ROOT_ORG_ALIAS, ROOT_ORG_NAME};
pub use record::OrgRecord;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
