//! Order endpoints
//!
//! Listing and detail are public (private orders need a share token or a
//! party session); everything that mutates requires a session.

use actix_session::Session;
use actix_web::{web, HttpResponse};
use barter_marketplace_common::{OrderStatus, TradeDirection};
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiError;
use crate::handlers::auth_helpers::{optional_session_user, session_user};
use crate::models::order::OrderListFilter;
use crate::services::orders::{CreateOrderInput, ItemInput, OrderService};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub unit: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub estimated_value: Option<f64>,
    pub currency: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

impl From<ItemRequest> for ItemInput {
    fn from(req: ItemRequest) -> Self {
        ItemInput {
            name: req.name,
            description: req.description,
            quantity: req.quantity,
            unit: req.unit,
            category: req.category,
            estimated_value: req.estimated_value,
            currency: req.currency,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub direction: TradeDirection,
    #[validate]
    pub offering_items: Vec<ItemRequest>,
    #[validate]
    pub requesting_items: Vec<ItemRequest>,
    #[serde(default)]
    pub is_private: bool,
    pub expiry_days: Option<i64>,
}

pub async fn create(
    service: web::Data<OrderService>,
    session: Session,
    req: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;
    let req = req.into_inner();
    req.validate()?;

    let input = CreateOrderInput {
        title: req.title,
        description: req.description,
        direction: req.direction,
        offering_items: req.offering_items.into_iter().map(Into::into).collect(),
        requesting_items: req.requesting_items.into_iter().map(Into::into).collect(),
        is_private: req.is_private,
        expiry_days: req.expiry_days,
    };

    let created = service.create(input, identity.user_id).await?;
    Ok(HttpResponse::Created().json(created))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

pub async fn list(
    service: web::Data<OrderService>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse::<OrderStatus>()
                .map_err(|_| ApiError::BadRequest(format!("Unknown order status: {s}")))
        })
        .transpose()?;

    // The public listing never includes private orders; the service-level
    // flag stays internal and is not reachable from the query string.
    let page = service
        .list(OrderListFilter {
            status,
            include_private: false,
            limit: query.limit.unwrap_or(20),
            offset: query.offset.unwrap_or(0),
        })
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    /// Share token for private orders.
    pub t: Option<String>,
}

pub async fn detail(
    service: web::Data<OrderService>,
    session: Session,
    path: web::Path<i32>,
    query: web::Query<DetailQuery>,
) -> Result<HttpResponse, ApiError> {
    let identity = optional_session_user(&session)?;
    let order = service
        .get_detail(
            path.into_inner(),
            query.into_inner().t,
            identity.map(|u| u.user_id),
        )
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

#[derive(Debug, Deserialize)]
pub struct DetailByIdQuery {
    pub id: i32,
    pub t: Option<String>,
}

/// Query-parameter variant of the detail lookup (`/orders/get?id=&t=`).
pub async fn detail_by_query(
    service: web::Data<OrderService>,
    session: Session,
    query: web::Query<DetailByIdQuery>,
) -> Result<HttpResponse, ApiError> {
    let identity = optional_session_user(&session)?;
    let query = query.into_inner();
    let order = service
        .get_detail(query.id, query.t, identity.map(|u| u.user_id))
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIdRequest {
    pub order_id: i32,
}

pub async fn accept(
    service: web::Data<OrderService>,
    session: Session,
    req: web::Json<OrderIdRequest>,
) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;
    let order = service.accept(req.order_id, identity.user_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn complete(
    service: web::Data<OrderService>,
    session: Session,
    req: web::Json<OrderIdRequest>,
) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;
    let order = service.complete(req.order_id, identity.user_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn delete(
    service: web::Data<OrderService>,
    session: Session,
    req: web::Json<OrderIdRequest>,
) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;
    service.delete(req.order_id, identity.user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub order_id: i32,
    pub expiry_days: Option<i64>,
}

pub async fn generate_share_token(
    service: web::Data<OrderService>,
    session: Session,
    req: web::Json<ShareRequest>,
) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;
    let order = service
        .generate_share_token(req.order_id, identity.user_id, req.expiry_days)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "orderId": order.id,
        "shareToken": order.share_token,
        "shareTokenExpiresAt": order.share_token_expires_at,
    })))
}

pub async fn revoke_share_token(
    service: web::Data<OrderService>,
    session: Session,
    req: web::Json<OrderIdRequest>,
) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;
    service
        .revoke_share_token(req.order_id, identity.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct MyOrdersQuery {
    pub role: Option<String>,
}

pub async fn my_orders(
    service: web::Data<OrderService>,
    session: Session,
    query: web::Query<MyOrdersQuery>,
) -> Result<HttpResponse, ApiError> {
    let identity = session_user(&session)?;
    if let Some(role) = query.role.as_deref() {
        if role != "creator" && role != "accepter" {
            return Err(ApiError::BadRequest(
                "Role must be 'creator' or 'accepter'".to_string(),
            ));
        }
    }

    let orders = service
        .user_orders(identity.user_id, query.into_inner().role)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "orders": orders,
        "count": orders.len(),
    })))
}
