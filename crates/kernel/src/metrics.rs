//! Prometheus metrics collection.

use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

use crate::models::Permission;

/// HTTP request labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: String,
    pub path: String,
    pub status: u16,
}

/// Settings change labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct PermissionLabels {
    pub permission: String,
    pub enabled: String,
}

/// Application metrics.
pub struct Metrics {
    registry: Registry,

    /// HTTP request counter by method/path/status.
    pub http_requests: Family<HttpLabels, Counter>,

    /// HTTP request duration histogram.
    pub http_duration_seconds: Family<HttpLabels, Histogram>,

    /// Permission changes forwarded to the data API.
    pub permission_changes: Family<PermissionLabels, Counter>,

    /// Settings changes rejected because the caller is not a platform admin.
    pub forbidden_changes: Counter,
}

impl Metrics {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests = Family::<HttpLabels, Counter>::default();
        registry.register(
            "http_requests_total",
            "Total HTTP requests",
            http_requests.clone(),
        );

        let http_duration_seconds = Family::<HttpLabels, Histogram>::new_with_constructor(|| {
            Histogram::new(exponential_buckets(0.001, 2.0, 12))
        });
        registry.register(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
            http_duration_seconds.clone(),
        );

        let permission_changes = Family::<PermissionLabels, Counter>::default();
        registry.register(
            "service_permission_changes_total",
            "Service permission changes",
            permission_changes.clone(),
        );

        let forbidden_changes = Counter::default();
        registry.register(
            "forbidden_settings_changes_total",
            "Settings changes rejected for non platform admins",
            forbidden_changes.clone(),
        );

        Self {
            registry,
            http_requests,
            http_duration_seconds,
            permission_changes,
            forbidden_changes,
        }
    }

    /// Record an HTTP request against its route template.
    pub fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let labels = HttpLabels {
            method: method.to_string(),
            path: path.to_string(),
            status,
        };

        self.http_requests.get_or_create(&labels).inc();
        self.http_duration_seconds
            .get_or_create(&labels)
            .observe(duration_secs);
    }

    /// Record a permission change.
    pub fn record_permission_change(&self, permission: Permission, enabled: bool) {
        let labels = PermissionLabels {
            permission: permission.to_string(),
            enabled: enabled.to_string(),
        };
        self.permission_changes.get_or_create(&labels).inc();
    }

    /// Record a rejected settings change.
    pub fn record_forbidden(&self) {
        self.forbidden_changes.inc();
    }

    /// Encode metrics in Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if let Err(e) = encode(&mut buffer, &self.registry) {
            tracing::error!(error = %e, "failed to encode metrics");
        }
        buffer
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish()
    }
}
