//! User profile endpoints

use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

use crate::db::DbPool;
use crate::error::ApiError;
use crate::handlers::auth_helpers::session_user;
use crate::models::User;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// Update the authenticated user's display name.
pub async fn update_profile(
    pool: web::Data<DbPool>,
    session: Session,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;
    let req = req.into_inner();
    req.validate()?;

    let pool = pool.into_inner();
    let user = tokio::task::spawn_blocking(move || -> Result<User, ApiError> {
        let mut conn = crate::services::get_conn(&pool)?;
        Ok(User::update_name(
            &mut conn,
            identity.user_id,
            req.name.trim(),
        )?)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??;

    Ok(HttpResponse::Ok().json(&user))
}
