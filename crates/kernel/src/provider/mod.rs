//! Collaborator interfaces for the records this console reads and updates.
//!
//! Services, users and inbound numbers are owned by the notifications data
//! API. The console talks to them through the traits below so the HTTP layer
//! never knows whether it is backed by [`ApiClient`] or the in-process
//! [`MemoryProvider`].

pub mod api;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{InboundNumber, Permission, Service, User};

pub use api::ApiClient;
pub use memory::{MemoryProvider, Seed};

/// Errors raised by a record provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("record not found")]
    NotFound,

    #[error("data API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("data API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to sign data API token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("invalid data API url: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias using ProviderError.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Source of service records and the sink for service updates.
///
/// Every method is a single request to the backing store; consistency of
/// concurrent updates to one service is the store's concern.
#[async_trait]
pub trait ServiceRecordProvider: Send + Sync {
    /// Fetch a service snapshot.
    async fn get(&self, service_id: Uuid) -> ProviderResult<Option<Service>>;

    /// Set membership of `permission` in the service's permission set.
    async fn force_permission(
        &self,
        service_id: Uuid,
        permission: Permission,
        on: bool,
    ) -> ProviderResult<()>;

    /// Move a service between trial (`restricted`) and live.
    async fn set_restricted(&self, service_id: Uuid, restricted: bool) -> ProviderResult<()>;

    async fn archive(&self, service_id: Uuid) -> ProviderResult<()>;

    async fn suspend(&self, service_id: Uuid) -> ProviderResult<()>;

    async fn resume(&self, service_id: Uuid) -> ProviderResult<()>;

    /// Inbound numbers not yet assigned to any service.
    async fn available_inbound_numbers(&self) -> ProviderResult<Vec<InboundNumber>>;

    async fn assign_inbound_number(
        &self,
        service_id: Uuid,
        inbound_number_id: Uuid,
    ) -> ProviderResult<()>;

    /// Whether the backing store is reachable.
    async fn healthy(&self) -> bool;
}

/// Source of user records.
#[async_trait]
pub trait UserRecordProvider: Send + Sync {
    async fn get_user(&self, user_id: Uuid) -> ProviderResult<Option<User>>;
}
