//! Org Manager
//!
//! Lifecycle registry for isolated orgs sharing one process.
//!
//! # Core Concepts
//!
//! - [`OrgManager`]: Registry of running orgs, indexed by id and client nonce
//! - [`ServiceFactory`]: Starts the per-org service bundle
//! - [`OrgManager::scan`]: Starts orgs persisted by peers
//! - [`Reconciler`]: Repeats the scan on an interval
//! - [`OrgService`]: Ordered bootstrap and shutdown
//!
//! # Example
//!
//! ```rust
//! use orgs_core::{NullServiceFactory, OrgManager, OrgService};
//! use orgs_datastore::MemoryDatastore;
//! use orgs_types::Config;
//! use std::sync::Arc;
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let manager = OrgManager::new(Config::default(), Arc::new(NullServiceFactory))
//!     .with_datastore(Arc::new(MemoryDatastore::new()));
//! let mut service = OrgService::start(Arc::new(manager)).await.unwrap();
//!
//! let acme = service.manager().create_new_org("Acme", None).unwrap();
//! let config = service.manager().get_org_config(acme.org_id.as_str()).unwrap();
//! assert_eq!(config.org_name, "Acme");
//!
//! service.stop().await;
//! # });
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod bootstrap;
pub mod error;
pub mod locator;
pub mod manager;
pub mod reconcile;
pub mod services;

// Re-exports
pub use bootstrap::{BootstrapState, OrgService};
pub use error::{OrgError, OrgResult, ServiceError};
pub use locator::{org_manager, register_org_manager};
pub use manager::OrgManager;
pub use reconcile::{Reconciler, ReconcilerHandle, ScanReport};
pub use services::{NullServiceContainer, NullServiceFactory, ServiceContainer, ServiceFactory};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
