//! Session cookie configuration
//!
//! Sessions are signed cookies (actix-session `CookieSessionStore`), so
//! the bearer token the browser holds is opaque and tamper-evident. The
//! signing key comes from `SESSION_SECRET`; without one a random key is
//! generated and every session dies on restart, which is fine for
//! development and loudly logged.

use actix_web::cookie::Key;
use anyhow::{bail, Result};
use tracing::warn;

pub const DEFAULT_COOKIE_NAME: &str = "p2p_session";
pub const DEFAULT_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_days: i64,
    pub cookie_secure: bool,
    pub key: Key,
}

impl SessionConfig {
    /// Load from `SESSION_SECRET`, `SESSION_COOKIE_NAME`, `SESSION_TTL_DAYS`
    /// and `SESSION_COOKIE_SECURE`.
    pub fn from_env() -> Result<Self> {
        let key = match std::env::var("SESSION_SECRET") {
            Ok(secret) if !secret.is_empty() => {
                // Accept hex-encoded or raw secrets; Key requires >= 64 bytes.
                let bytes = match hex::decode(&secret) {
                    Ok(decoded) if decoded.len() >= 64 => decoded,
                    _ => secret.into_bytes(),
                };
                if bytes.len() < 64 {
                    bail!("SESSION_SECRET must be at least 64 bytes (got {})", bytes.len());
                }
                Key::from(&bytes)
            }
            _ => {
                warn!("SESSION_SECRET not set, using a random key; sessions reset on restart");
                Key::generate()
            }
        };

        let cookie_name = std::env::var("SESSION_COOKIE_NAME")
            .ok()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());

        let ttl_days = std::env::var("SESSION_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_TTL_DAYS);

        let cookie_secure = std::env::var("SESSION_COOKIE_SECURE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            cookie_name,
            ttl_days,
            cookie_secure,
            key,
        })
    }

    /// Session lifetime in seconds, used both for the cookie TTL and the
    /// `expires_at` claim stored inside the session.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_days * 24 * 60 * 60
    }
}
