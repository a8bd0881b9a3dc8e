//! Org registry
//!
//! [`OrgManager`] owns every running org in the process: its record, its
//! derived config and its service container. Two indexes are kept, id to
//! org and client nonce to id, and both are updated under one lock so a
//! reader never sees one without the other.

use crate::error::{OrgError, OrgResult};
use crate::services::{ServiceContainer, ServiceFactory};
use orgs_datastore::{set_json, Datastore, DatastoreError, OrgPathManager};
use orgs_types::{derive_org_config, Config, Nonce, OrgId, OrgRecord};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Everything the process holds for one running org
#[derive(Debug)]
pub(crate) struct OrgContext {
    record: OrgRecord,
    config: Arc<Config>,
    services: Box<dyn ServiceContainer>,
}

#[derive(Debug, Default)]
struct OrgTable {
    orgs: HashMap<OrgId, OrgContext>,
    org_id_by_nonce: HashMap<Nonce, OrgId>,
}

impl OrgTable {
    fn insert(&mut self, context: OrgContext) {
        let record = &context.record;
        if !record.nonce.is_empty() {
            self.org_id_by_nonce
                .insert(record.nonce.clone(), record.org_id.clone());
        }
        self.orgs.insert(record.org_id.clone(), context);
    }
}

/// Result of bringing an org up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Process-wide org registry
///
/// All methods take `&self`; share it behind an `Arc`. Lookups never block
/// on service start-up or datastore I/O: those run outside the table lock.
#[derive(Debug)]
pub struct OrgManager {
    root: Arc<Config>,
    datastore: Option<Arc<dyn Datastore>>,
    services: Arc<dyn ServiceFactory>,
    table: Mutex<OrgTable>,
    closed: AtomicBool,
}

impl OrgManager {
    /// Create a registry for the process configured by `root`
    ///
    /// The registry starts empty; the root org is started by bootstrap.
    /// Without [`OrgManager::with_datastore`] orgs cannot be created or
    /// reconciled.
    pub fn new(root: Config, services: Arc<dyn ServiceFactory>) -> Self {
        Self {
            root: Arc::new(root),
            datastore: None,
            services,
            table: Mutex::new(OrgTable::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Persist org records in `datastore`
    #[must_use]
    pub fn with_datastore(mut self, datastore: Arc<dyn Datastore>) -> Self {
        self.datastore = Some(datastore);
        self
    }

    /// Root configuration
    #[inline]
    #[must_use]
    pub fn root_config(&self) -> &Arc<Config> {
        &self.root
    }

    /// Datastore holding org records, if any
    #[inline]
    #[must_use]
    pub fn datastore(&self) -> Option<&Arc<dyn Datastore>> {
        self.datastore.as_ref()
    }

    /// Whether org records are persisted
    #[inline]
    #[must_use]
    pub fn has_datastore(&self) -> bool {
        self.datastore.is_some()
    }

    /// Number of running orgs, root included
    #[must_use]
    pub fn org_count(&self) -> usize {
        self.table.lock().orgs.len()
    }

    /// Records of every running org, ordered by name then id
    #[must_use]
    pub fn list_orgs(&self) -> Vec<OrgRecord> {
        let mut records: Vec<OrgRecord> = self
            .table
            .lock()
            .orgs
            .values()
            .map(|context| context.record.clone())
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.org_id.cmp(&b.org_id)));
        records
    }

    /// Derived configuration of a running org
    ///
    /// `""` and `"root"` both address the root org.
    ///
    /// # Errors
    /// - [`OrgError::RootOrgNotStarted`] for the root org before bootstrap
    /// - [`OrgError::NotFound`] for any other unknown id
    pub fn get_org_config(&self, org_id: &str) -> OrgResult<Arc<Config>> {
        let key = OrgId::lookup(org_id);
        let table = self.table.lock();
        match table.orgs.get(&key) {
            Some(context) => Ok(Arc::clone(&context.config)),
            None => Err(missing(&key, org_id)),
        }
    }

    /// Record of a running org
    ///
    /// # Errors
    /// Same as [`OrgManager::get_org_config`]
    pub fn get_org(&self, org_id: &str) -> OrgResult<OrgRecord> {
        let key = OrgId::lookup(org_id);
        let table = self.table.lock();
        match table.orgs.get(&key) {
            Some(context) => Ok(context.record.clone()),
            None => Err(missing(&key, org_id)),
        }
    }

    /// Resolve a client nonce to the org it was issued for
    ///
    /// The root org's nonce comes from the root config and resolves without
    /// consulting the table.
    ///
    /// # Errors
    /// [`OrgError::NotFound`] for empty or unknown nonces
    pub fn org_id_by_nonce(&self, nonce: &str) -> OrgResult<OrgId> {
        if nonce.is_empty() {
            return Err(OrgError::NotFound(String::new()));
        }
        if self.root.client_nonce() == Some(nonce) {
            return Ok(OrgId::root());
        }
        self.table
            .lock()
            .org_id_by_nonce
            .get(nonce)
            .cloned()
            .ok_or_else(|| OrgError::NotFound(nonce.to_string()))
    }

    /// Create, start and persist a new org
    ///
    /// A fresh id is generated when `org_id` is `None` or empty. The org is
    /// running before its record is written, so on
    /// [`OrgError::PersistFailed`] it stays live in this process only.
    ///
    /// # Errors
    /// - [`OrgError::InvalidOrgId`] for `"root"` or ids that are not a
    ///   single path component
    /// - [`OrgError::DatastoreNotConfigured`] without a datastore
    /// - [`OrgError::AlreadyExists`] if the id is running or already has a
    ///   persisted record
    /// - [`OrgError::Datastore`] if the existing record cannot be checked
    /// - [`OrgError::StartFailed`] if services fail; nothing is persisted
    /// - [`OrgError::PersistFailed`] if the record write fails
    pub fn create_new_org(&self, name: &str, org_id: Option<&str>) -> OrgResult<OrgRecord> {
        let (org_id, explicit) = match org_id {
            None | Some("") => (OrgId::generate(), false),
            Some(id) => (OrgId::parse(id)?, true),
        };
        let datastore = self
            .datastore
            .as_ref()
            .ok_or(OrgError::DatastoreNotConfigured)?;
        let path = OrgPathManager::new(org_id.clone())
            .path()
            .map_err(DatastoreError::from)?;

        if self.table.lock().orgs.contains_key(&org_id) {
            return Err(OrgError::AlreadyExists(org_id));
        }
        // A peer may have persisted this id without us having scanned it yet
        if explicit {
            match datastore.get_subject(&path) {
                Ok(_) => return Err(OrgError::AlreadyExists(org_id)),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err.into()),
            }
        }

        let record = OrgRecord::new(org_id.clone(), name);
        if self.launch(record.clone())? == StartOutcome::AlreadyRunning {
            return Err(OrgError::AlreadyExists(org_id));
        }

        set_json(datastore.as_ref(), &path, &record).map_err(|source: DatastoreError| {
            tracing::warn!(org_id = %org_id, error = %source, "org started but its record was not persisted");
            OrgError::PersistFailed {
                org_id: org_id.clone(),
                source,
            }
        })?;

        tracing::info!(org_id = %org_id, name = %record.name, "created org");
        Ok(record)
    }

    /// Bring an org up from its record
    ///
    /// Idempotent: starting an org that is already running is a no-op and
    /// its services are not started a second time.
    ///
    /// # Errors
    /// [`OrgError::StartFailed`] if services fail; the registry is unchanged
    pub fn start_org(&self, record: OrgRecord) -> OrgResult<()> {
        self.launch(record).map(|_| ())
    }

    pub(crate) fn launch(&self, record: OrgRecord) -> OrgResult<StartOutcome> {
        if self.table.lock().orgs.contains_key(&record.org_id) {
            return Ok(StartOutcome::AlreadyRunning);
        }

        let org_id = record.org_id.clone();
        let config = Arc::new(derive_org_config(&self.root, &record));
        let services = self
            .services
            .start(Arc::clone(&config))
            .map_err(|source| {
                tracing::warn!(org_id = %org_id, error = %source, "org services failed to start");
                OrgError::StartFailed {
                    org_id: org_id.clone(),
                    source,
                }
            })?;

        let mut table = self.table.lock();
        if table.orgs.contains_key(&org_id) {
            drop(table);
            tracing::debug!(org_id = %org_id, "org started concurrently, closing duplicate services");
            services.close();
            return Ok(StartOutcome::AlreadyRunning);
        }
        table.insert(OrgContext {
            record,
            config,
            services,
        });
        drop(table);

        tracing::info!(org_id = %org_id, "org started");
        Ok(StartOutcome::Started)
    }

    /// Close every org's services
    ///
    /// Non-root orgs close first, the root org last. Records stay in the
    /// table. Only the first call does anything.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let table = self.table.lock();
        let mut root = None;
        for (org_id, context) in &table.orgs {
            if org_id.is_root() {
                root = Some(context);
            } else {
                context.services.close();
            }
        }
        if let Some(context) = root {
            context.services.close();
        }
        tracing::info!(orgs = table.orgs.len(), "org services closed");
    }
}

fn missing(key: &OrgId, requested: &str) -> OrgError {
    if key.is_root() {
        OrgError::RootOrgNotStarted
    } else {
        OrgError::NotFound(requested.to_string())
    }
}
