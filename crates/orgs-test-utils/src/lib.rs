//! Testing utilities for the org manager workspace
//!
//! Shared service doubles, datastores and config fixtures.

#![allow(missing_docs)]

use orgs_core::{OrgManager, ServiceContainer, ServiceError, ServiceFactory};
use orgs_datastore::{
    set_json, Datastore, DatastoreError, DatastorePath, DatastoreResult, MemoryDatastore,
    OrgPathManager,
};
use orgs_types::{ClientConfig, Config, DatastoreConfig, OrgId, OrgRecord};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const ROOT_NONCE: &str = "root-nonce";

/// Root config with a client nonce and memory datastore section
pub fn root_config() -> Config {
    Config {
        client: Some(ClientConfig {
            nonce: ROOT_NONCE.to_string(),
            server_urls: vec!["https://localhost:8000/".to_string()],
            ..ClientConfig::default()
        }),
        datastore: Some(DatastoreConfig {
            implementation: "Memory".to_string(),
            location: "/data".to_string(),
            filestore_directory: "/files".to_string(),
        }),
        ..Config::default()
    }
}

/// Service factory that records every start and close
#[derive(Debug, Default)]
pub struct RecordingServiceFactory {
    started: Mutex<Vec<String>>,
    closed: Arc<Mutex<Vec<String>>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingServiceFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make starts for `org_id` fail from now on
    pub fn fail_for(&self, org_id: &str) {
        self.failing.lock().insert(org_id.to_string());
    }

    pub fn start_count(&self) -> usize {
        self.started.lock().len()
    }

    pub fn starts_for(&self, org_id: &str) -> usize {
        self.started.lock().iter().filter(|id| *id == org_id).count()
    }

    /// Org ids in start order
    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closed.lock().len()
    }

    /// Org ids in close order
    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().clone()
    }
}

impl ServiceFactory for RecordingServiceFactory {
    fn start(&self, config: Arc<Config>) -> Result<Box<dyn ServiceContainer>, ServiceError> {
        if self.failing.lock().contains(&config.org_id) {
            return Err(ServiceError::start_failed("test", "configured to fail"));
        }
        self.started.lock().push(config.org_id.clone());
        Ok(Box::new(RecordingContainer {
            org_id: config.org_id.clone(),
            closed: Arc::clone(&self.closed),
        }))
    }
}

#[derive(Debug)]
pub struct RecordingContainer {
    org_id: String,
    closed: Arc<Mutex<Vec<String>>>,
}

impl ServiceContainer for RecordingContainer {
    fn close(&self) {
        self.closed.lock().push(self.org_id.clone());
    }
}

/// Memory datastore with switchable failures
#[derive(Debug, Default)]
pub struct FlakyDatastore {
    inner: MemoryDatastore,
    fail_writes: AtomicBool,
    fail_lists: AtomicBool,
}

impl FlakyDatastore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Datastore for FlakyDatastore {
    fn get_subject(&self, path: &DatastorePath) -> DatastoreResult<Vec<u8>> {
        self.inner.get_subject(path)
    }

    fn set_subject(&self, path: &DatastorePath, data: &[u8]) -> DatastoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DatastoreError::Unavailable("injected write failure".into()));
        }
        self.inner.set_subject(path, data)
    }

    fn list_children(&self, path: &DatastorePath) -> DatastoreResult<Vec<DatastorePath>> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(DatastoreError::Unavailable("injected list failure".into()));
        }
        self.inner.list_children(path)
    }
}

/// Write an org record the way a peer process would
pub fn persist_record(store: &dyn Datastore, id: &str, name: &str) -> OrgRecord {
    let record = OrgRecord::new(OrgId::parse(id).unwrap(), name);
    let path = OrgPathManager::new(record.org_id.clone()).path().unwrap();
    set_json(store, &path, &record).unwrap();
    record
}

/// Manager over `store` using `factory`, root org not yet started
pub fn manager_with(
    store: Arc<dyn Datastore>,
    factory: Arc<RecordingServiceFactory>,
) -> Arc<OrgManager> {
    Arc::new(OrgManager::new(root_config(), factory).with_datastore(store))
}
