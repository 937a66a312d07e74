//! Escrow endpoints
//!
//! All mutations require a session; wallet-level authorization (who may
//! fund, accept, complete) is enforced by the service against the wallet
//! recorded in the session.

use actix_session::Session;
use actix_web::{web, HttpResponse};
use barter_marketplace_common::AssetType;
use serde::Deserialize;

use crate::error::ApiError;
use crate::handlers::auth_helpers::session_user;
use crate::services::escrow::{CreateEscrowInput, EscrowService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEscrowRequest {
    pub order_id: i32,
    pub asset_type: AssetType,
    pub token_address: Option<String>,
    pub amount: String,
    pub accepter: Option<String>,
}

pub async fn create(
    service: web::Data<EscrowService>,
    session: Session,
    req: web::Json<CreateEscrowRequest>,
) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;
    let req = req.into_inner();

    let record = service
        .create(
            CreateEscrowInput {
                order_id: req.order_id,
                asset_type: req.asset_type,
                token_address: req.token_address,
                amount: req.amount,
                accepter: req.accepter,
            },
            identity.user_id,
        )
        .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "escrowRecordId": record.id,
        "escrow": record,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundRequest {
    pub escrow_record_id: i32,
    pub tx_hash: String,
    /// Contract-assigned escrow id, once the deposit transaction mined.
    pub escrow_id: Option<i64>,
}

pub async fn fund(
    service: web::Data<EscrowService>,
    session: Session,
    req: web::Json<FundRequest>,
) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;
    let record = service
        .fund(
            req.escrow_record_id,
            &identity.wallet_address,
            &req.tx_hash,
            req.escrow_id,
        )
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "escrow": record })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptRequest {
    pub escrow_record_id: i32,
    pub tx_hash: Option<String>,
}

pub async fn accept(
    service: web::Data<EscrowService>,
    session: Session,
    req: web::Json<AcceptRequest>,
) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;
    let record = service
        .accept(
            req.escrow_record_id,
            identity.user_id,
            &identity.wallet_address,
            req.tx_hash.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "escrow": record })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub escrow_record_id: i32,
    pub tx_hash: String,
}

pub async fn complete(
    service: web::Data<EscrowService>,
    session: Session,
    req: web::Json<CompleteRequest>,
) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;
    let record = service
        .complete(req.escrow_record_id, &identity.wallet_address, &req.tx_hash)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "escrow": record })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub escrow_record_id: Option<i32>,
    pub order_id: Option<i32>,
}

/// Read-only escrow lookup by record id or order id.
pub async fn status(
    service: web::Data<EscrowService>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, ApiError> {
    let record = match (query.escrow_record_id, query.order_id) {
        (Some(record_id), _) => service.status_by_record(record_id).await?,
        (None, Some(order_id)) => service.status_by_order(order_id).await?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Provide escrowRecordId or orderId".to_string(),
            ))
        }
    };
    Ok(HttpResponse::Ok().json(record))
}
