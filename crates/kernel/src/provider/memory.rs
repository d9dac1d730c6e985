//! In-process record store for local development and tests.
//!
//! Records live in `DashMap`s keyed by id. A YAML seed file can populate the
//! store at startup so the console runs without a data API.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{ProviderError, ProviderResult, ServiceRecordProvider, UserRecordProvider};
use crate::models::{InboundNumber, Permission, Service, User};

/// Seed file contents.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub inbound_numbers: Vec<InboundNumber>,
}

/// In-memory service, user and inbound number records.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    services: DashMap<Uuid, Service>,
    users: DashMap<Uuid, User>,
    inbound_numbers: DashMap<Uuid, InboundNumber>,
}

impl MemoryProvider {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store populated from seed records.
    pub fn from_seed(seed: Seed) -> Self {
        let provider = Self::new();
        for service in seed.services {
            provider.insert_service(service);
        }
        for user in seed.users {
            provider.insert_user(user);
        }
        for number in seed.inbound_numbers {
            provider.insert_inbound_number(number);
        }
        provider
    }

    /// Load a YAML seed file.
    pub fn load_seed(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        let seed: Seed = serde_yml::from_str(&raw)
            .with_context(|| format!("failed to parse seed file {}", path.display()))?;

        info!(
            services = seed.services.len(),
            users = seed.users.len(),
            inbound_numbers = seed.inbound_numbers.len(),
            "loaded seed records"
        );

        Ok(Self::from_seed(seed))
    }

    /// Insert or replace a service.
    pub fn insert_service(&self, service: Service) {
        self.services.insert(service.id, service);
    }

    /// Insert or replace a user.
    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    /// Insert or replace an inbound number.
    pub fn insert_inbound_number(&self, number: InboundNumber) {
        self.inbound_numbers.insert(number.id, number);
    }

    /// Inbound number currently assigned to a service, if any.
    pub fn inbound_number_for_service(&self, service_id: Uuid) -> Option<InboundNumber> {
        self.inbound_numbers
            .iter()
            .find(|n| n.service_id == Some(service_id))
            .map(|n| n.value().clone())
    }

    /// Apply `update` to a stored service.
    fn update_service(
        &self,
        service_id: Uuid,
        update: impl FnOnce(&mut Service),
    ) -> ProviderResult<()> {
        let mut service = self
            .services
            .get_mut(&service_id)
            .ok_or(ProviderError::NotFound)?;
        update(service.value_mut());
        Ok(())
    }
}

#[async_trait]
impl ServiceRecordProvider for MemoryProvider {
    async fn get(&self, service_id: Uuid) -> ProviderResult<Option<Service>> {
        Ok(self.services.get(&service_id).map(|s| s.value().clone()))
    }

    async fn force_permission(
        &self,
        service_id: Uuid,
        permission: Permission,
        on: bool,
    ) -> ProviderResult<()> {
        self.update_service(service_id, |service| {
            service.permissions.set(permission, on);
        })
    }

    async fn set_restricted(&self, service_id: Uuid, restricted: bool) -> ProviderResult<()> {
        self.update_service(service_id, |service| service.restricted = restricted)
    }

    async fn archive(&self, service_id: Uuid) -> ProviderResult<()> {
        self.update_service(service_id, |service| service.active = false)
    }

    async fn suspend(&self, service_id: Uuid) -> ProviderResult<()> {
        self.update_service(service_id, |service| service.active = false)
    }

    async fn resume(&self, service_id: Uuid) -> ProviderResult<()> {
        self.update_service(service_id, |service| service.active = true)
    }

    async fn available_inbound_numbers(&self) -> ProviderResult<Vec<InboundNumber>> {
        let mut numbers: Vec<InboundNumber> = self
            .inbound_numbers
            .iter()
            .filter(|n| n.is_available())
            .map(|n| n.value().clone())
            .collect();
        numbers.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(numbers)
    }

    async fn assign_inbound_number(
        &self,
        service_id: Uuid,
        inbound_number_id: Uuid,
    ) -> ProviderResult<()> {
        if !self.services.contains_key(&service_id) {
            return Err(ProviderError::NotFound);
        }

        let mut number = self
            .inbound_numbers
            .get_mut(&inbound_number_id)
            .ok_or(ProviderError::NotFound)?;

        if !number.is_available() {
            return Err(ProviderError::Api {
                status: 400,
                message: format!("inbound number {} is not available", number.number),
            });
        }

        number.service_id = Some(service_id);
        Ok(())
    }

    async fn healthy(&self) -> bool {
        true
    }
}

#[async_trait]
impl UserRecordProvider for MemoryProvider {
    async fn get_user(&self, user_id: Uuid) -> ProviderResult<Option<User>> {
        Ok(self.users.get(&user_id).map(|u| u.value().clone()))
    }
}
