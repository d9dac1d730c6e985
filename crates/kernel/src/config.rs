//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Data API connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the notifications data API.
    pub host_name: String,

    /// Issuer used when signing API tokens (default: notify-admin).
    pub client_id: String,

    /// Shared secret for API tokens.
    pub client_secret: String,

    /// HTTP client timeout (default: 30s).
    pub timeout: Duration,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// Data API settings. When None, records come from the in-memory store.
    pub api: Option<ApiConfig>,

    /// YAML seed for the in-memory store.
    pub seed_file: Option<PathBuf>,

    /// Redis URL for sessions. When None, sessions are kept in process memory.
    pub redis_url: Option<String>,

    /// Path to the templates directory (default: ./templates).
    pub templates_dir: PathBuf,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "strict").
    pub cookie_same_site: String,

    /// Only send the session cookie over HTTPS (default: true).
    pub cookie_secure: bool,

    /// Where anonymous visitors are sent (default: /sign-in).
    pub sign_in_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let api = match env::var("API_HOST_NAME") {
            Ok(host_name) => {
                let client_secret = env::var("ADMIN_CLIENT_SECRET")
                    .context("ADMIN_CLIENT_SECRET is required when API_HOST_NAME is set")?;
                if client_secret.is_empty() {
                    bail!("ADMIN_CLIENT_SECRET must not be empty");
                }

                let client_id =
                    env::var("ADMIN_CLIENT_ID").unwrap_or_else(|_| "notify-admin".to_string());

                let timeout_secs: u64 = env::var("API_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("API_TIMEOUT_SECS must be a valid u64")?;

                Some(ApiConfig {
                    host_name,
                    client_id,
                    client_secret,
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            Err(_) => None,
        };

        let seed_file = env::var("SEED_FILE").ok().map(PathBuf::from);

        let redis_url = env::var("REDIS_URL").ok().filter(|v| !v.is_empty());

        let templates_dir = env::var("TEMPLATES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./templates"));

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let cookie_same_site = env::var("COOKIE_SAME_SITE")
            .unwrap_or_else(|_| "strict".to_string())
            .to_lowercase();

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let sign_in_url = env::var("SIGN_IN_URL").unwrap_or_else(|_| "/sign-in".to_string());

        Ok(Self {
            port,
            api,
            seed_file,
            redis_url,
            templates_dir,
            cors_allowed_origins,
            cookie_same_site,
            cookie_secure,
            sign_in_url,
        })
    }
}
