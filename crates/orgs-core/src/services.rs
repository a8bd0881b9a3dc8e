//! Per-org service containers
//!
//! The org manager does not implement any services itself. It asks a
//! [`ServiceFactory`] to start a [`ServiceContainer`] bound to an org's
//! derived config, and owns the container for the rest of the process.

use crate::error::ServiceError;
use orgs_types::Config;
use std::fmt::Debug;
use std::sync::Arc;

/// Running bundle of services for one org
pub trait ServiceContainer: Send + Sync + Debug {
    /// Stop every service in the bundle
    ///
    /// Called once, at process shutdown.
    fn close(&self);
}

/// Starts service containers
pub trait ServiceFactory: Send + Sync + Debug {
    /// Start the services for the org `config` belongs to
    ///
    /// # Errors
    /// [`ServiceError`] if the bundle cannot be brought up; no container is
    /// returned in that case
    fn start(&self, config: Arc<Config>) -> Result<Box<dyn ServiceContainer>, ServiceError>;
}

/// Factory for deployments that run no per-org services
#[derive(Debug, Clone, Copy, Default)]
pub struct NullServiceFactory;

impl ServiceFactory for NullServiceFactory {
    fn start(&self, config: Arc<Config>) -> Result<Box<dyn ServiceContainer>, ServiceError> {
        tracing::debug!(org_id = %config.org_id, org_name = %config.org_name, "no services to start");
        Ok(Box::new(NullServiceContainer {
            org_id: config.org_id.clone(),
        }))
    }
}

/// Container started by [`NullServiceFactory`]
#[derive(Debug)]
pub struct NullServiceContainer {
    org_id: String,
}

impl ServiceContainer for NullServiceContainer {
    fn close(&self) {
        tracing::debug!(org_id = %self.org_id, "closing empty service container");
    }
}
