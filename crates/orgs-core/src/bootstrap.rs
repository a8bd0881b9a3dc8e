//! Startup sequencing
//!
//! Brings the registry to its steady state in a fixed order:
//!
//! ```text
//! NotStarted → RootOrgStarting → RootOrgReady ─┬→ InitialScanSkipped
//!                                              └→ InitialScanDone → PeriodicScanRunning
//! ```
//!
//! and later `Stopped`. The root org is running before any other org
//! starts, and the first scan has finished before `start` returns.

use crate::error::OrgResult;
use crate::manager::OrgManager;
use crate::reconcile::{Reconciler, ReconcilerHandle};
use orgs_types::{Nonce, OrgRecord};
use std::sync::Arc;
use std::time::Duration;

/// Bootstrap progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    NotStarted,
    RootOrgStarting,
    RootOrgReady,
    /// No datastore; no scan was run and none will be
    InitialScanSkipped,
    InitialScanDone,
    PeriodicScanRunning,
    Stopped,
}

/// Running org service: the registry plus its reconciler
#[derive(Debug)]
pub struct OrgService {
    manager: Arc<OrgManager>,
    reconciler: Option<ReconcilerHandle>,
    state: BootstrapState,
}

impl OrgService {
    /// Bootstrap using the scan interval from the root config
    ///
    /// # Errors
    /// See [`OrgService::start_with_interval`]
    pub async fn start(manager: Arc<OrgManager>) -> OrgResult<Self> {
        let interval = manager.root_config().org_manager.scan_interval();
        Self::start_with_interval(manager, interval).await
    }

    /// Start the root org, run the first scan and spawn the reconciler
    ///
    /// The first scan runs inline so that every persisted org is live
    /// when this returns. Must be called within a tokio runtime.
    ///
    /// # Errors
    /// - [`crate::OrgError::StartFailed`] if the root org cannot start
    /// - [`crate::OrgError::ScanFailed`] if the first scan cannot list
    ///   records; the root org's services are closed again
    pub async fn start_with_interval(
        manager: Arc<OrgManager>,
        interval: Duration,
    ) -> OrgResult<Self> {
        let mut service = Self {
            manager,
            reconciler: None,
            state: BootstrapState::NotStarted,
        };

        service.advance(BootstrapState::RootOrgStarting);
        let nonce = Nonce::new(service.manager.root_config().client_nonce().unwrap_or_default());
        service.manager.start_org(OrgRecord::root(nonce))?;
        service.advance(BootstrapState::RootOrgReady);

        if !service.manager.has_datastore() {
            service.advance(BootstrapState::InitialScanSkipped);
            return Ok(service);
        }

        let report = match service.manager.scan() {
            Ok(report) => report,
            Err(err) => {
                service.manager.shutdown();
                return Err(err);
            }
        };
        tracing::info!(
            started = report.started,
            skipped = report.skipped,
            failed = report.failed,
            "initial org scan finished"
        );
        service.advance(BootstrapState::InitialScanDone);

        service.reconciler = Some(Reconciler::new(Arc::clone(&service.manager), interval).spawn());
        service.advance(BootstrapState::PeriodicScanRunning);
        Ok(service)
    }

    fn advance(&mut self, state: BootstrapState) {
        tracing::debug!(from = ?self.state, to = ?state, "org bootstrap");
        self.state = state;
    }

    /// The registry
    #[inline]
    #[must_use]
    pub fn manager(&self) -> &Arc<OrgManager> {
        &self.manager
    }

    /// Current bootstrap state
    #[inline]
    #[must_use]
    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Stop the reconciler, wait for it, then close every org's services
    pub async fn stop(&mut self) {
        if self.state == BootstrapState::Stopped {
            return;
        }
        if let Some(reconciler) = self.reconciler.take() {
            reconciler.stop().await;
        }
        self.manager.shutdown();
        self.advance(BootstrapState::Stopped);
    }
}
