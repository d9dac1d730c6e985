//! Notifications data API client.
//!
//! Every request is signed with a short-lived HS256 JWT whose issuer is the
//! admin client id. Successful responses wrap their payload in
//! `{"data": ...}`; failures carry `{"result": "error", "message": ...}`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{ProviderError, ProviderResult, ServiceRecordProvider, UserRecordProvider};
use crate::models::{InboundNumber, Permission, Service, User};

/// Claims the data API expects on admin client tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiTokenClaims {
    /// Issuer: the admin client id.
    pub iss: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

/// Response envelope used by the data API.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Error body used by the data API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: serde_json::Value,
}

/// HTTP client for the notifications data API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    client_id: String,
    encoding_key: EncodingKey,
}

impl ApiClient {
    /// Create a client for the API at `base_url`.
    pub fn new(base_url: &str, client_id: &str, secret: &str, timeout: Duration) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends in '/'.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized).context("API_HOST_NAME must be a valid URL")?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("notify-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build data API HTTP client")?;

        Ok(Self {
            http,
            base_url,
            client_id: client_id.to_string(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Sign a fresh bearer token for one request.
    pub fn token(&self) -> ProviderResult<String> {
        let claims = ApiTokenClaims {
            iss: self.client_id.clone(),
            iat: chrono::Utc::now().timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Resolve an API path against the base URL.
    pub fn url(&self, path: &str) -> ProviderResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ProviderResult<T> {
        let url = self.url(path)?;
        debug!(%url, "data API GET");

        let response = self
            .http
            .get(url)
            .bearer_auth(self.token()?)
            .send()
            .await?;

        let response = check_status(response).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> ProviderResult<()> {
        let url = self.url(path)?;
        debug!(%url, "data API POST");

        let response = self
            .http
            .post(url)
            .bearer_auth(self.token()?)
            .json(body)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn update_service(&self, service_id: Uuid, body: serde_json::Value) -> ProviderResult<()> {
        self.post_json(&format!("service/{service_id}"), &body).await
    }
}

/// Map non-success responses onto [`ProviderError`].
async fn check_status(response: reqwest::Response) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound);
    }

    let text = response.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        status: status.as_u16(),
        message: error_message(&text),
    })
}

/// Pull the human-readable message out of an error body.
///
/// The API sends either a string or a map of field errors.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: serde_json::Value::String(message),
        }) => message,
        Ok(ErrorBody { message }) if !message.is_null() => message.to_string(),
        _ => body.to_string(),
    }
}

/// Treat a 404 as "no such record" for lookups.
fn optional<T>(result: ProviderResult<T>) -> ProviderResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ProviderError::NotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ServiceRecordProvider for ApiClient {
    async fn get(&self, service_id: Uuid) -> ProviderResult<Option<Service>> {
        optional(self.get_json(&format!("service/{service_id}")).await)
    }

    async fn force_permission(
        &self,
        service_id: Uuid,
        permission: Permission,
        on: bool,
    ) -> ProviderResult<()> {
        // The API only accepts the full permission list.
        let service = self.get(service_id).await?.ok_or(ProviderError::NotFound)?;
        let mut permissions = service.permissions;
        permissions.set(permission, on);

        self.update_service(service_id, json!({ "permissions": permissions.names() }))
            .await
    }

    async fn set_restricted(&self, service_id: Uuid, restricted: bool) -> ProviderResult<()> {
        self.update_service(service_id, json!({ "restricted": restricted }))
            .await
    }

    async fn archive(&self, service_id: Uuid) -> ProviderResult<()> {
        self.post_json(&format!("service/{service_id}/archive"), &json!({}))
            .await
    }

    async fn suspend(&self, service_id: Uuid) -> ProviderResult<()> {
        self.post_json(&format!("service/{service_id}/suspend"), &json!({}))
            .await
    }

    async fn resume(&self, service_id: Uuid) -> ProviderResult<()> {
        self.post_json(&format!("service/{service_id}/resume"), &json!({}))
            .await
    }

    async fn available_inbound_numbers(&self) -> ProviderResult<Vec<InboundNumber>> {
        self.get_json("inbound-number/available").await
    }

    async fn assign_inbound_number(
        &self,
        service_id: Uuid,
        inbound_number_id: Uuid,
    ) -> ProviderResult<()> {
        self.post_json(
            &format!("inbound-number/service/{service_id}"),
            &json!({ "inbound_number_id": inbound_number_id }),
        )
        .await
    }

    async fn healthy(&self) -> bool {
        let Ok(url) = self.url("_status") else {
            return false;
        };
        match self.http.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "data API status check failed");
                false
            }
        }
    }
}

#[async_trait]
impl UserRecordProvider for ApiClient {
    async fn get_user(&self, user_id: Uuid) -> ProviderResult<Option<User>> {
        optional(self.get_json(&format!("user/{user_id}")).await)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("client_id", &self.client_id)
            .finish()
    }
}
