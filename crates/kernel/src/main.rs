//! Notify admin console
//!
//! Serves the service settings pages for platform admins and team members.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use notify_admin_kernel::server::{RouteTable, build_app, build_cors_layer, serve};
use notify_admin_kernel::session::{self, CookieOptions};
use notify_admin_kernel::{AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting notify admin console");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(port = config.port, "Configuration loaded");

    let state = AppState::new(&config).context("failed to initialize application state")?;

    let cookies = CookieOptions::new(&config.cookie_same_site, config.cookie_secure);
    let cors = build_cors_layer(&config);
    let routes = RouteTable::standard();

    let app = match &config.redis_url {
        Some(url) => {
            let session_layer = session::create_session_layer(url, cookies)
                .await
                .context("failed to create session layer")?;
            info!("Sessions stored in Redis");
            build_app(state, routes, session_layer, cors)
        }
        None => {
            info!("No REDIS_URL configured, sessions stored in memory");
            build_app(
                state,
                routes,
                session::create_memory_session_layer(cookies),
                cors,
            )
        }
    };

    serve(app, config.port).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
