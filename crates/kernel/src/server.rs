//! Router assembly and the HTTP listener.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::middleware::track_http_metrics;
use crate::routes;
use crate::state::AppState;

/// Named route groups, merged in registration order.
///
/// Built once at startup and handed to [`build_app`]; nothing registers
/// routes after the server starts.
#[derive(Default)]
pub struct RouteTable {
    groups: Vec<(&'static str, Router<AppState>)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every route group the console serves.
    pub fn standard() -> Self {
        Self::new()
            .group("health", routes::health::router())
            .group("metrics", routes::metrics::router())
            .group("service_settings", routes::service_settings::router())
    }

    /// Add a route group.
    pub fn group(mut self, name: &'static str, router: Router<AppState>) -> Self {
        self.groups.push((name, router));
        self
    }

    /// Group names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.groups.iter().map(|(name, _)| *name).collect()
    }

    fn into_router(self) -> Router<AppState> {
        self.groups
            .into_iter()
            .fold(Router::new(), |app, (name, router)| {
                debug!(group = name, "registering routes");
                app.merge(router)
            })
    }
}

/// Build the application router with all middleware applied.
///
/// Middleware order (last added = first executed in request flow):
/// TraceLayer → CORS → session → http metrics → routes
pub fn build_app<S>(
    state: AppState,
    routes: RouteTable,
    session_layer: SessionManagerLayer<S>,
    cors: CorsLayer,
) -> Router
where
    S: SessionStore + Clone,
{
    routes
        .into_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            track_http_metrics,
        ))
        .layer(session_layer)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the CORS layer from configuration.
pub fn build_cors_layer(config: &Config) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if config.cors_allowed_origins.len() == 1 && config.cors_allowed_origins[0] == "*" {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
            .allow_credentials(true)
    }
}

/// Bind to `port` on all interfaces and serve `app` until shutdown.
pub async fn serve(app: Router, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
