//! Session identity helpers
//!
//! Sessions carry four claims: `user_id`, `wallet_address`, `issued_at`
//! and `expires_at` (unix seconds). Expiry is enforced here on every
//! read, independently of the cookie TTL, so a stolen cookie cannot
//! outlive the server-side window.

use actix_session::Session;
use chrono::Utc;

use crate::error::ApiError;

pub const SESSION_USER_ID: &str = "user_id";
pub const SESSION_WALLET: &str = "wallet_address";
pub const SESSION_ISSUED_AT: &str = "issued_at";
pub const SESSION_EXPIRES_AT: &str = "expires_at";

/// The authenticated caller, as recorded at sign-in time.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: i32,
    /// Lowercase wallet address.
    pub wallet_address: String,
}

/// Require a valid, unexpired session.
pub fn session_user(session: &Session) -> Result<SessionUser, ApiError> {
    optional_session_user(session)?.ok_or_else(|| {
        ApiError::Unauthorized("Authentication required. Please sign in.".to_string())
    })
}

/// Read the session identity if one is present and still valid.
///
/// An expired session is purged and treated as absent rather than as an
/// error, so public endpoints keep working for stale cookies.
pub fn optional_session_user(session: &Session) -> Result<Option<SessionUser>, ApiError> {
    let user_id = match session.get::<i32>(SESSION_USER_ID) {
        Ok(Some(id)) => id,
        _ => return Ok(None),
    };
    let wallet_address = match session.get::<String>(SESSION_WALLET) {
        Ok(Some(addr)) => addr,
        _ => return Ok(None),
    };

    match session.get::<i64>(SESSION_EXPIRES_AT) {
        Ok(Some(expires_at)) if Utc::now().timestamp() < expires_at => Ok(Some(SessionUser {
            user_id,
            wallet_address,
        })),
        _ => {
            session.purge();
            Ok(None)
        }
    }
}

/// Install the session claims after a successful SIWE verification.
pub fn establish_session(
    session: &Session,
    user_id: i32,
    wallet_address: &str,
    ttl_seconds: i64,
) -> Result<(), ApiError> {
    let now = Utc::now().timestamp();

    session.renew();
    session
        .insert(SESSION_USER_ID, user_id)
        .and_then(|_| session.insert(SESSION_WALLET, wallet_address))
        .and_then(|_| session.insert(SESSION_ISSUED_AT, now))
        .and_then(|_| session.insert(SESSION_EXPIRES_AT, now + ttl_seconds))
        .map_err(|e| ApiError::Internal(format!("Failed to establish session: {e}")))
}
