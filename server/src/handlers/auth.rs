//! Wallet authentication (Sign-In-With-Ethereum)
//!
//! Flow: the client asks for a nonce for its wallet address, embeds it in
//! an EIP-4361 message, signs with `personal_sign`, and posts message +
//! signature to `/siwe`. The server recovers the signer, consumes the
//! nonce (single use), and establishes a cookie session.

use actix_session::Session;
use actix_web::{get, post, web, HttpResponse};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::crypto::siwe;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::handlers::auth_helpers::{establish_session, session_user};
use crate::log_address;
use crate::models::User;
use crate::validation::normalize_eth_address;

/// EIP-4361 suggests at least 8 alphanumeric characters; 17 matches what
/// common SIWE client libraries generate.
const NONCE_LEN: usize = 17;

fn new_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct NonceQuery {
    pub address: String,
}

/// Issue a sign-in nonce for a wallet, creating the user on first sight.
#[get("/nonce")]
pub async fn nonce(
    pool: web::Data<DbPool>,
    query: web::Query<NonceQuery>,
) -> Result<HttpResponse, ApiError> {
    let wallet = normalize_eth_address(&query.address)
        .map_err(|_| ApiError::BadRequest("Invalid Ethereum address".to_string()))?;

    let nonce = new_nonce();
    let pool = pool.into_inner();
    let user = {
        let wallet = wallet.clone();
        let nonce = nonce.clone();
        tokio::task::spawn_blocking(move || -> Result<User, ApiError> {
            let mut conn = crate::services::get_conn(&pool)?;
            let user = User::get_or_create_by_wallet(&mut conn, &wallet)?;
            User::issue_nonce(&mut conn, user.id, &nonce)?;
            Ok(user)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??
    };

    info!(wallet = %log_address!(&wallet), "Sign-in nonce issued");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "nonce": nonce,
        "userId": user.id,
        "address": user.wallet_address,
    })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub message: String,
    pub signature: String,
}

/// Verify a signed SIWE message and establish the session.
///
/// The nonce inside the message must match the one stored for the wallet
/// and is cleared atomically, so a captured message cannot be replayed.
#[post("/siwe")]
pub async fn siwe_login(
    pool: web::Data<DbPool>,
    session_config: web::Data<SessionConfig>,
    session: Session,
    req: web::Json<VerifyRequest>,
) -> Result<HttpResponse, ApiError> {
    let fields = siwe::parse_message(&req.message)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    siwe::verify_signature(&req.message, &req.signature, &fields.address).map_err(|e| match e {
        siwe::SiweError::SignerMismatch => {
            warn!(wallet = %log_address!(&fields.address), "SIWE signature mismatch");
            ApiError::Unauthorized("Signature does not match the message address".to_string())
        }
        other => ApiError::BadRequest(other.to_string()),
    })?;

    let pool = pool.into_inner();
    let user = {
        let address = fields.address.clone();
        // Named to dodge the `nonce` route struct the macro above defines.
        let nonce_value = fields.nonce.clone();
        tokio::task::spawn_blocking(move || -> Result<User, ApiError> {
            let mut conn = crate::services::get_conn(&pool)?;

            let user = User::find_by_wallet(&mut conn, &address)?.ok_or_else(|| {
                ApiError::Unauthorized("No sign-in challenge for this wallet".to_string())
            })?;

            if !User::consume_nonce(&mut conn, user.id, &nonce_value)? {
                return Err(ApiError::Unauthorized(
                    "Nonce is invalid or already used".to_string(),
                ));
            }
            Ok(user)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??
    };

    establish_session(
        &session,
        user.id,
        &user.wallet_address,
        session_config.ttl_seconds(),
    )?;

    info!(user_id = user.id, wallet = %log_address!(&user.wallet_address), "User signed in");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "user": user })))
}

#[post("/logout")]
pub async fn logout(session: Session) -> Result<HttpResponse, ApiError> {
    session.purge();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

/// Return the authenticated user's profile.
#[get("/me")]
pub async fn me(pool: web::Data<DbPool>, session: Session) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;

    let pool = pool.into_inner();
    let user = tokio::task::spawn_blocking(move || -> Result<User, ApiError> {
        let mut conn = crate::services::get_conn(&pool)?;
        User::find_by_id(&mut conn, identity.user_id)?
            .ok_or_else(|| ApiError::Unauthorized("Session user no longer exists".to_string()))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??;

    Ok(HttpResponse::Ok().json(&user))
}
