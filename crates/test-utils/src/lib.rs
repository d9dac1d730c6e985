//! Notify admin test utilities.
//!
//! Fixtures for services and users, a provider decorator that records every
//! mutation, and assertion helpers for rendered pages.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use notify_admin_kernel::models::{InboundNumber, Permission, PermissionSet, Service, User};
use notify_admin_kernel::provider::{ProviderResult, ServiceRecordProvider};

/// Create a test service: active, in trial mode, with email and SMS.
pub fn service_one() -> TestService {
    test_service("service one").with_permissions(&[Permission::Email, Permission::Sms])
}

/// Create a test service with no permissions.
pub fn test_service(name: &str) -> TestService {
    TestService {
        id: Uuid::new_v4(),
        name: name.to_string(),
        active: true,
        restricted: true,
        permissions: Vec::new(),
    }
}

/// A test service builder.
#[derive(Debug, Clone)]
pub struct TestService {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub restricted: bool,
    pub permissions: Vec<Permission>,
}

impl TestService {
    /// Replace the permission set.
    pub fn with_permissions(mut self, permissions: &[Permission]) -> Self {
        self.permissions = permissions.to_vec();
        self
    }

    /// Add a single permission.
    pub fn with_permission(mut self, permission: Permission) -> Self {
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
        self
    }

    pub fn live(mut self) -> Self {
        self.restricted = false;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn build(self) -> Service {
        Service {
            id: self.id,
            name: self.name,
            active: self.active,
            restricted: self.restricted,
            permissions: self.permissions.into_iter().collect::<PermissionSet>(),
        }
    }
}

/// Create a platform admin user.
pub fn platform_admin_user() -> User {
    User {
        id: Uuid::new_v4(),
        name: "Platform admin user".to_string(),
        email_address: "platform@admin.gov.uk".to_string(),
        platform_admin: true,
        services: Vec::new(),
    }
}

/// Create a normal user on the team of `service_id`.
pub fn active_user_with_permissions(service_id: Uuid) -> User {
    User {
        id: Uuid::new_v4(),
        name: "Test User".to_string(),
        email_address: "test@user.gov.uk".to_string(),
        platform_admin: false,
        services: vec![service_id],
    }
}

/// Create an unassigned inbound number.
pub fn inbound_number(number: &str) -> InboundNumber {
    InboundNumber {
        id: Uuid::new_v4(),
        number: number.to_string(),
        active: true,
        service_id: None,
    }
}

/// A mutation observed by [`RecordingServiceProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    ForcePermission {
        service_id: Uuid,
        permission: Permission,
        on: bool,
    },
    SetRestricted {
        service_id: Uuid,
        restricted: bool,
    },
    Archive(Uuid),
    Suspend(Uuid),
    Resume(Uuid),
    AssignInboundNumber {
        service_id: Uuid,
        inbound_number_id: Uuid,
    },
}

/// Records every mutation, then forwards it to the wrapped provider.
///
/// Reads are forwarded without being recorded.
pub struct RecordingServiceProvider {
    inner: Arc<dyn ServiceRecordProvider>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingServiceProvider {
    pub fn new(inner: Arc<dyn ServiceRecordProvider>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Mutations recorded so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Mutations that touched `service_id`.
    pub fn calls_for(&self, service_id: Uuid) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.service_id() == service_id)
            .cloned()
            .collect()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().push(call);
    }
}

impl RecordedCall {
    pub fn service_id(&self) -> Uuid {
        match self {
            Self::ForcePermission { service_id, .. }
            | Self::SetRestricted { service_id, .. }
            | Self::AssignInboundNumber { service_id, .. } => *service_id,
            Self::Archive(id) | Self::Suspend(id) | Self::Resume(id) => *id,
        }
    }
}

#[async_trait]
impl ServiceRecordProvider for RecordingServiceProvider {
    async fn get(&self, service_id: Uuid) -> ProviderResult<Option<Service>> {
        self.inner.get(service_id).await
    }

    async fn force_permission(
        &self,
        service_id: Uuid,
        permission: Permission,
        on: bool,
    ) -> ProviderResult<()> {
        self.record(RecordedCall::ForcePermission {
            service_id,
            permission,
            on,
        });
        self.inner.force_permission(service_id, permission, on).await
    }

    async fn set_restricted(&self, service_id: Uuid, restricted: bool) -> ProviderResult<()> {
        self.record(RecordedCall::SetRestricted {
            service_id,
            restricted,
        });
        self.inner.set_restricted(service_id, restricted).await
    }

    async fn archive(&self, service_id: Uuid) -> ProviderResult<()> {
        self.record(RecordedCall::Archive(service_id));
        self.inner.archive(service_id).await
    }

    async fn suspend(&self, service_id: Uuid) -> ProviderResult<()> {
        self.record(RecordedCall::Suspend(service_id));
        self.inner.suspend(service_id).await
    }

    async fn resume(&self, service_id: Uuid) -> ProviderResult<()> {
        self.record(RecordedCall::Resume(service_id));
        self.inner.resume(service_id).await
    }

    async fn available_inbound_numbers(&self) -> ProviderResult<Vec<InboundNumber>> {
        self.inner.available_inbound_numbers().await
    }

    async fn assign_inbound_number(
        &self,
        service_id: Uuid,
        inbound_number_id: Uuid,
    ) -> ProviderResult<()> {
        self.record(RecordedCall::AssignInboundNumber {
            service_id,
            inbound_number_id,
        });
        self.inner
            .assign_inbound_number(service_id, inbound_number_id)
            .await
    }

    async fn healthy(&self) -> bool {
        self.inner.healthy().await
    }
}

/// Assertion helpers for rendered pages.
pub mod assert {
    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }
}
