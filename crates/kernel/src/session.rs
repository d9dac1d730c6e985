//! Session management.
//!
//! Sessions live in Redis when `REDIS_URL` is configured, otherwise in
//! process memory (local development and tests).

use anyhow::{Context, Result};
use fred::prelude::*;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_redis_store::RedisStore;

/// Default session expiry (24 hours).
pub const DEFAULT_SESSION_EXPIRY_HOURS: i64 = 24;

/// Cookie options shared by every session layer.
#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
    pub same_site: SameSite,
    pub secure: bool,
}

impl CookieOptions {
    /// Parse the configured SameSite policy; anything unknown is strict.
    pub fn new(same_site: &str, secure: bool) -> Self {
        let same_site = match same_site {
            "lax" => SameSite::Lax,
            "none" => SameSite::None,
            _ => SameSite::Strict,
        };
        Self { same_site, secure }
    }
}

fn configure<S: SessionStore + Clone>(store: S, options: CookieOptions) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_secure(options.secure)
        .with_http_only(true)
        .with_same_site(options.same_site)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            DEFAULT_SESSION_EXPIRY_HOURS,
        )))
}

/// Create the session layer using Redis as the backend.
pub async fn create_session_layer(
    redis_url: &str,
    options: CookieOptions,
) -> Result<SessionManagerLayer<RedisStore<Pool>>> {
    let config = Config::from_url(redis_url).context("failed to parse Redis URL")?;

    let pool = Builder::from_config(config)
        .build_pool(1)
        .context("failed to create Redis pool")?;

    pool.init()
        .await
        .context("failed to connect to Redis for sessions")?;

    Ok(configure(RedisStore::new(pool), options))
}

/// Create a session layer backed by process memory.
pub fn create_memory_session_layer(options: CookieOptions) -> SessionManagerLayer<MemoryStore> {
    configure(MemoryStore::default(), options)
}
