//! Process-wide org manager slot
//!
//! For code that cannot be handed an `Arc<OrgManager>` directly. Prefer
//! passing the manager explicitly.

use crate::error::{OrgError, OrgResult};
use crate::manager::OrgManager;
use once_cell::sync::OnceCell;
use std::sync::Arc;

static ORG_MANAGER: OnceCell<Arc<OrgManager>> = OnceCell::new();

/// Publish `manager` as the process-wide org manager
///
/// The first registration wins; later ones are ignored and return `false`.
pub fn register_org_manager(manager: Arc<OrgManager>) -> bool {
    let registered = ORG_MANAGER.set(manager).is_ok();
    if !registered {
        tracing::debug!("org manager already registered, keeping the first");
    }
    registered
}

/// The process-wide org manager
///
/// # Errors
/// [`OrgError::ManagerNotRegistered`] before [`register_org_manager`]
pub fn org_manager() -> OrgResult<Arc<OrgManager>> {
    ORG_MANAGER
        .get()
        .cloned()
        .ok_or(OrgError::ManagerNotRegistered)
}
