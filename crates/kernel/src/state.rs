//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::metrics::Metrics;
use crate::provider::{ApiClient, MemoryProvider, ServiceRecordProvider, UserRecordProvider};
use crate::theme::ThemeEngine;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap. Nothing in here changes after
/// startup; service and user records always come from the providers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Service records (data API or in-memory store).
    services: Arc<dyn ServiceRecordProvider>,

    /// User records (data API or in-memory store).
    users: Arc<dyn UserRecordProvider>,

    /// Theme engine for template rendering.
    theme: Arc<ThemeEngine>,

    /// Prometheus metrics.
    metrics: Arc<Metrics>,

    /// Where anonymous visitors are redirected.
    sign_in_url: String,
}

impl AppState {
    /// Create application state from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let theme = ThemeEngine::new(&config.templates_dir)
            .context("failed to initialize theme engine")?;

        let (services, users): (Arc<dyn ServiceRecordProvider>, Arc<dyn UserRecordProvider>) =
            match &config.api {
                Some(api) => {
                    let client = Arc::new(
                        ApiClient::new(
                            &api.host_name,
                            &api.client_id,
                            &api.client_secret,
                            api.timeout,
                        )
                        .context("failed to create data API client")?,
                    );
                    info!(api = %api.host_name, "using notifications data API");
                    let services: Arc<dyn ServiceRecordProvider> = client.clone();
                    let users: Arc<dyn UserRecordProvider> = client;
                    (services, users)
                }
                None => {
                    let store = Arc::new(match &config.seed_file {
                        Some(path) => MemoryProvider::load_seed(path)?,
                        None => {
                            warn!(
                                "no API_HOST_NAME or SEED_FILE configured, starting with an empty in-memory store"
                            );
                            MemoryProvider::new()
                        }
                    });
                    let services: Arc<dyn ServiceRecordProvider> = store.clone();
                    let users: Arc<dyn UserRecordProvider> = store;
                    (services, users)
                }
            };

        Ok(Self::with_providers(
            services,
            users,
            theme,
            &config.sign_in_url,
        ))
    }

    /// Create application state from already-built parts.
    pub fn with_providers(
        services: Arc<dyn ServiceRecordProvider>,
        users: Arc<dyn UserRecordProvider>,
        theme: ThemeEngine,
        sign_in_url: &str,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                services,
                users,
                theme: Arc::new(theme),
                metrics: Arc::new(Metrics::new()),
                sign_in_url: sign_in_url.to_string(),
            }),
        }
    }

    /// Get the service record provider.
    pub fn services(&self) -> &dyn ServiceRecordProvider {
        self.inner.services.as_ref()
    }

    /// Get the user record provider.
    pub fn users(&self) -> &dyn UserRecordProvider {
        self.inner.users.as_ref()
    }

    /// Get the theme engine.
    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    /// Get the metrics registry.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    /// Where anonymous visitors are redirected.
    pub fn sign_in_url(&self) -> &str {
        &self.inner.sign_in_url
    }

    /// Check if the data API is reachable.
    pub async fn api_healthy(&self) -> bool {
        self.inner.services.healthy().await
    }
}
