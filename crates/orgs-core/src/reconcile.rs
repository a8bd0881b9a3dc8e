//! Reconciliation against persisted org records
//!
//! Peers sharing a datastore create orgs independently. A scan starts
//! every persisted org this process is not yet running; the
//! [`Reconciler`] repeats the scan on an interval until cancelled.

use crate::error::{OrgError, OrgResult};
use crate::manager::{OrgManager, StartOutcome};
use orgs_datastore::{get_json, orgs_root, Datastore, DatastorePath};
use orgs_types::{OrgId, OrgRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Outcome of one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Orgs started by this scan
    pub started: usize,
    /// Records for orgs that were already running
    pub already_running: usize,
    /// Records that were unreadable or inconsistent
    pub skipped: usize,
    /// Orgs whose services failed to start
    pub failed: usize,
}

impl ScanReport {
    /// Records looked at
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.started + self.already_running + self.skipped + self.failed
    }
}

impl OrgManager {
    /// Start every persisted org not yet running in this process
    ///
    /// Unreadable records are skipped and start failures are counted; one
    /// bad org never stops the pass.
    ///
    /// # Errors
    /// - [`OrgError::DatastoreNotConfigured`] without a datastore
    /// - [`OrgError::ScanFailed`] if the org records cannot be listed
    pub fn scan(&self) -> OrgResult<ScanReport> {
        let datastore = self.datastore().ok_or(OrgError::DatastoreNotConfigured)?;
        let children = datastore
            .list_children(&orgs_root())
            .map_err(OrgError::ScanFailed)?;

        let mut report = ScanReport::default();
        for child in children {
            let Some(record) = load_record(datastore.as_ref(), &child) else {
                report.skipped += 1;
                continue;
            };
            if self.get_org_config(record.org_id.as_str()).is_ok() {
                report.already_running += 1;
                continue;
            }
            let org_id = record.org_id.clone();
            match self.launch(record) {
                Ok(StartOutcome::Started) => report.started += 1,
                Ok(StartOutcome::AlreadyRunning) => report.already_running += 1,
                Err(err) => {
                    tracing::warn!(org_id = %org_id, error = %err, "scan could not start org");
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            started = report.started,
            already_running = report.already_running,
            skipped = report.skipped,
            failed = report.failed,
            "org scan complete"
        );
        Ok(report)
    }
}

fn load_record(datastore: &dyn Datastore, path: &DatastorePath) -> Option<OrgRecord> {
    let record: OrgRecord = match get_json(datastore, path) {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "skipping unreadable org record");
            return None;
        }
    };
    if OrgId::parse(record.org_id.as_str()).is_err() {
        tracing::warn!(path = %path, org_id = %record.org_id, "skipping org record with a reserved or invalid id");
        return None;
    }
    if path.base() != Some(record.org_id.as_str()) {
        tracing::warn!(path = %path, org_id = %record.org_id, "skipping org record stored under the wrong path");
        return None;
    }
    Some(record)
}

/// Periodic scan driver
#[derive(Debug)]
pub struct Reconciler {
    manager: Arc<OrgManager>,
    interval: Duration,
}

impl Reconciler {
    /// Reconciler scanning every `interval`
    pub fn new(manager: Arc<OrgManager>, interval: Duration) -> Self {
        Self { manager, interval }
    }

    /// Spawn the scan loop on the current tokio runtime
    ///
    /// The first scan runs one full interval after spawning.
    #[must_use]
    pub fn spawn(self) -> ReconcilerHandle {
        let (cancel, cancelled) = watch::channel(false);
        let join = tokio::spawn(self.run(cancelled));
        ReconcilerHandle {
            cancel,
            join: Some(join),
        }
    }

    async fn run(self, mut cancelled: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        tracing::info!(interval = ?self.interval, "org reconciler started");
        loop {
            tokio::select! {
                biased;
                changed = cancelled.changed() => {
                    if changed.is_err() || *cancelled.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => self.run_pass().await,
            }
        }
        tracing::info!("org reconciler stopped");
    }

    async fn run_pass(&self) {
        let manager = Arc::clone(&self.manager);
        match tokio::task::spawn_blocking(move || manager.scan()).await {
            Ok(Ok(report)) if report.started > 0 => {
                tracing::info!(started = report.started, "reconciler started new orgs");
            }
            Ok(Ok(_)) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "org scan failed"),
            Err(err) => tracing::error!(error = %err, "org scan task aborted"),
        }
    }
}

/// Handle to a spawned [`Reconciler`]
///
/// Dropping the handle cancels the loop without waiting for it.
#[derive(Debug)]
pub struct ReconcilerHandle {
    cancel: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// Signal the loop to exit after any pass in progress
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Whether the loop has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel and wait for the loop to exit
    pub async fn stop(mut self) {
        self.cancel();
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                tracing::error!(error = %err, "org reconciler task failed");
            }
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NullServiceFactory;
    use orgs_datastore::{set_json, MemoryDatastore, OrgPathManager};
    use orgs_types::Config;

    fn manager() -> (Arc<OrgManager>, Arc<MemoryDatastore>) {
        let store = Arc::new(MemoryDatastore::new());
        let manager = OrgManager::new(Config::default(), Arc::new(NullServiceFactory))
            .with_datastore(store.clone());
        (Arc::new(manager), store)
    }

    fn persist(store: &MemoryDatastore, id: &str, name: &str) -> OrgRecord {
        let record = OrgRecord::new(OrgId::parse(id).unwrap(), name);
        let path = OrgPathManager::new(record.org_id.clone()).path().unwrap();
        set_json(store, &path, &record).unwrap();
        record
    }

    #[test]
    fn scan_starts_persisted_orgs_once() {
        let (manager, store) = manager();
        persist(&store, "O1", "One");
        persist(&store, "O2", "Two");

        let first = manager.scan().unwrap();
        assert_eq!(first.started, 2);
        let second = manager.scan().unwrap();
        assert_eq!(second.started, 0);
        assert_eq!(second.already_running, 2);
        assert_eq!(manager.get_org("O2").unwrap().name, "Two");
    }

    #[test]
    fn scan_skips_bad_records() {
        let (manager, store) = manager();
        persist(&store, "O1", "One");
        let garbage = orgs_root().child("O2").unwrap();
        store.set_subject(&garbage, b"not json").unwrap();
        let misplaced = orgs_root().child("O3").unwrap();
        let record = OrgRecord::new(OrgId::parse("O4").unwrap(), "Four");
        set_json(store.as_ref(), &misplaced, &record).unwrap();
        let reserved = orgs_root().child("root").unwrap();
        store
            .set_subject(&reserved, br#"{"org_id": "root", "name": "Imposter", "nonce": "n1"}"#)
            .unwrap();

        let report = manager.scan().unwrap();
        assert_eq!(report.started, 1);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.already_running, 0);
        assert_eq!(report.total(), 4);
        assert!(manager.get_org("O4").is_err());
        assert!(manager.org_id_by_nonce("n1").unwrap_err().is_not_found());
    }

    #[test]
    fn scan_without_datastore() {
        let manager = OrgManager::new(Config::default(), Arc::new(NullServiceFactory));
        assert!(matches!(
            manager.scan(),
            Err(OrgError::DatastoreNotConfigured)
        ));
    }

    #[tokio::test]
    async fn reconciler_picks_up_new_records() {
        let (manager, store) = manager();
        let handle = Reconciler::new(Arc::clone(&manager), Duration::from_millis(20)).spawn();
        persist(&store, "O1", "One");

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while manager.get_org("O1").is_err() {
            assert!(tokio::time::Instant::now() < deadline, "org never started");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.stop().await;
    }

    #[tokio::test]
    async fn reconciler_stops_promptly() {
        let (manager, _) = manager();
        let handle = Reconciler::new(manager, Duration::from_secs(3600)).spawn();
        assert!(!handle.is_finished());
        tokio::time::timeout(Duration::from_secs(1), handle.stop())
            .await
            .unwrap();
    }
}
