//! CSRF token generation and verification.
//!
//! Tokens are stored in the session as `token:timestamp` strings. They are
//! single-use and expire after an hour.

use anyhow::{Result, anyhow, bail};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tower_sessions::Session;

/// Session key for storing CSRF tokens.
const CSRF_SESSION_KEY: &str = "csrf_tokens";

/// Maximum number of tokens to store per session.
const MAX_TOKENS: usize = 10;

/// Token validity period in seconds (1 hour).
const TOKEN_VALIDITY_SECS: i64 = 3600;

/// Split a stored `token:timestamp` entry.
fn parse_entry(entry: &str) -> Option<(&str, i64)> {
    let (token, timestamp) = entry.split_once(':')?;
    Some((token, timestamp.parse().ok()?))
}

fn is_fresh(timestamp: i64, now: i64) -> bool {
    now - timestamp <= TOKEN_VALIDITY_SECS
}

async fn stored_tokens(session: &Session) -> Vec<String> {
    session
        .get(CSRF_SESSION_KEY)
        .await
        .unwrap_or(None)
        .unwrap_or_default()
}

/// Generate a CSRF token and store it in the session.
pub async fn generate_csrf_token(session: &Session) -> Result<String> {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    let timestamp = chrono::Utc::now().timestamp();

    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    hasher.update(timestamp.to_le_bytes());
    let token = hex::encode(hasher.finalize());

    let mut tokens = stored_tokens(session).await;
    tokens.push(format!("{token}:{timestamp}"));

    // Keep only the most recent tokens
    if tokens.len() > MAX_TOKENS {
        let excess = tokens.len() - MAX_TOKENS;
        tokens.drain(..excess);
    }

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow!("failed to store CSRF token: {e}"))?;

    Ok(token)
}

/// Verify a CSRF token against the session, consuming it on success.
pub async fn verify_csrf_token(session: &Session, submitted: &str) -> Result<bool> {
    if submitted.is_empty() {
        bail!("empty CSRF token");
    }

    let mut tokens = stored_tokens(session).await;
    let now = chrono::Utc::now().timestamp();

    let found = tokens.iter().position(|entry| {
        parse_entry(entry)
            .is_some_and(|(token, timestamp)| token == submitted && is_fresh(timestamp, now))
    });

    let Some(index) = found else {
        return Ok(false);
    };

    tokens.remove(index);
    tokens.retain(|entry| parse_entry(entry).is_some_and(|(_, ts)| is_fresh(ts, now)));

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow!("failed to update CSRF tokens: {e}"))?;

    Ok(true)
}
