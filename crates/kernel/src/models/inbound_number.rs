//! Inbound SMS numbers that can be assigned to a service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An inbound number record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundNumber {
    pub id: Uuid,
    pub number: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub service_id: Option<Uuid>,
}

fn default_active() -> bool {
    true
}

impl InboundNumber {
    /// Active and not yet assigned to a service.
    pub fn is_available(&self) -> bool {
        self.active && self.service_id.is_none()
    }
}
