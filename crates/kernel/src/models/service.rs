//! Service record as supplied by the data API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permission::{Permission, PermissionSet};

/// Snapshot of a service.
///
/// Owned by the data API; the console only reads it and requests point
/// updates through a [`ServiceRecordProvider`](crate::provider::ServiceRecordProvider).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    /// False once the service has been archived or suspended.
    pub active: bool,
    /// True while the service is in trial mode (not live).
    pub restricted: bool,
    #[serde(default)]
    pub permissions: PermissionSet,
}

impl Service {
    /// Raw permission membership.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Whether the service is live (not restricted).
    pub fn is_live(&self) -> bool {
        !self.restricted
    }
}
