//! Order lifecycle service
//!
//! Enforces creation, listing, retrieval, acceptance, completion,
//! deletion, and share-token management for orders, atomically with
//! their items.
//!
//! State machine: PENDING →(accept)→ ACCEPTED →(complete)→ COMPLETED;
//! PENDING →(delete)→ row removed. Transitions are conditional updates,
//! so of two concurrent accepts exactly one wins and the loser observes
//! an invalid-state error.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use barter_marketplace_common::{ItemSide, OrderStatus, TradeDirection};
use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use rand::RngCore;
use serde::Serialize;
use tracing::info;

use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::order::OrderListFilter;
use crate::models::{EscrowRecord, NewOrder, NewOrderItem, Order, OrderItem};
use crate::services::get_conn;

/// One item on either side of a trade, as submitted at creation.
#[derive(Debug, Clone)]
pub struct ItemInput {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit: Option<String>,
    pub category: String,
    pub estimated_value: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub title: String,
    pub description: Option<String>,
    pub direction: TradeDirection,
    pub offering_items: Vec<ItemInput>,
    pub requesting_items: Vec<ItemInput>,
    pub is_private: bool,
    pub expiry_days: Option<i64>,
}

/// An order plus its two item lists, as the API returns it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub offering_items: Vec<OrderItem>,
    pub requesting_items: Vec<OrderItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<OrderWithItems>,
    pub total: i64,
}

#[derive(Clone)]
pub struct OrderService {
    pool: DbPool,
}

impl OrderService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create an order with both item lists in one transaction.
    pub async fn create(
        &self,
        input: CreateOrderInput,
        creator_id: i32,
    ) -> Result<OrderWithItems, ApiError> {
        validate_items(&input.offering_items)?;
        validate_items(&input.requesting_items)?;

        let now = Utc::now().naive_utc();
        let share_token_expires_at = expiry_from_days(input.expiry_days, now)?;
        let share_token = input.is_private.then(new_share_token);

        let pool = self.pool.clone();
        let created = tokio::task::spawn_blocking(move || -> Result<OrderWithItems, ApiError> {
            let mut conn = get_conn(&pool)?;

            conn.transaction::<OrderWithItems, ApiError, _>(|conn| {
                let order = Order::create(
                    conn,
                    &NewOrder {
                        title: input.title.trim().to_string(),
                        description: input.description.clone(),
                        direction: input.direction.as_str().to_string(),
                        status: OrderStatus::Pending.as_str().to_string(),
                        creator_id,
                        is_private: input.is_private,
                        share_token: share_token.clone(),
                        share_token_expires_at,
                    },
                )?;

                let mut rows = Vec::new();
                for (side, items) in [
                    (ItemSide::Offering, &input.offering_items),
                    (ItemSide::Requesting, &input.requesting_items),
                ] {
                    for item in items {
                        rows.push(NewOrderItem {
                            order_id: order.id,
                            side: side.as_str().to_string(),
                            name: item.name.trim().to_string(),
                            description: item.description.clone(),
                            quantity: item.quantity,
                            unit: item.unit.clone(),
                            category: Some(item.category.trim().to_string()),
                            estimated_value: item.estimated_value,
                            currency: item.currency.clone(),
                        });
                    }
                }
                OrderItem::insert_batch(conn, &rows)?;

                attach_items(conn, order)
            })
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??;

        info!(
            order_id = created.order.id,
            creator_id,
            private = created.order.is_private,
            "Order created"
        );
        Ok(created)
    }

    /// Public listing: excludes private orders unless explicitly asked,
    /// newest first, capped at 100 per page.
    pub async fn list(&self, filter: OrderListFilter) -> Result<OrderPage, ApiError> {
        if filter.offset < 0 {
            return Err(ApiError::BadRequest("Offset must be non-negative".to_string()));
        }
        let filter = OrderListFilter {
            limit: filter.limit.clamp(1, 100),
            ..filter
        };

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<OrderPage, ApiError> {
            let mut conn = get_conn(&pool)?;
            let (mut orders, total) = Order::list(&mut conn, &filter)?;
            // Share tokens grant access on their own; a listing is never
            // the place to hand them out.
            for order in &mut orders {
                order.share_token = None;
            }
            let orders = attach_items_many(&mut conn, orders)?;
            Ok(OrderPage { orders, total })
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))?
    }

    /// Fetch one order, enforcing the private-order access rules.
    ///
    /// A private order is visible to its creator and accepter; anyone else
    /// needs a share token that matches exactly, is not revoked, and is
    /// not past its expiry (evaluated lazily here, at read time).
    pub async fn get_detail(
        &self,
        order_id: i32,
        share_token: Option<String>,
        requesting_user_id: Option<i32>,
    ) -> Result<OrderWithItems, ApiError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<OrderWithItems, ApiError> {
            let mut conn = get_conn(&pool)?;

            let order = Order::find_by_id(&mut conn, order_id)?
                .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

            if order.is_private {
                let is_party = requesting_user_id
                    .map(|uid| uid == order.creator_id || Some(uid) == order.accepter_id)
                    .unwrap_or(false);

                if !is_party {
                    check_share_token(&order, share_token.as_deref())?;
                }
            }

            attach_items(&mut conn, order)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))?
    }

    /// Accept a PENDING order. The creator cannot accept their own order.
    pub async fn accept(&self, order_id: i32, accepter_id: i32) -> Result<OrderWithItems, ApiError> {
        let pool = self.pool.clone();
        let accepted = tokio::task::spawn_blocking(move || -> Result<OrderWithItems, ApiError> {
            let mut conn = get_conn(&pool)?;

            let order = Order::find_by_id(&mut conn, order_id)?
                .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

            if order.creator_id == accepter_id {
                return Err(ApiError::BadRequest(
                    "Cannot accept your own order".to_string(),
                ));
            }

            let updated = Order::accept(&mut conn, order_id, accepter_id, Utc::now().naive_utc())?;
            if updated == 0 {
                // Either the status was never PENDING or a concurrent
                // accept won the race; both read the same to the caller.
                return Err(ApiError::InvalidState(format!(
                    "Cannot accept order in {} status",
                    current_status(&mut conn, order_id)?
                )));
            }

            let order = Order::find_by_id(&mut conn, order_id)?
                .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;
            attach_items(&mut conn, order)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??;

        info!(order_id, accepter_id, "Order accepted");
        Ok(accepted)
    }

    /// Complete an ACCEPTED order. Only the creator or accepter may.
    pub async fn complete(
        &self,
        order_id: i32,
        acting_user_id: i32,
    ) -> Result<OrderWithItems, ApiError> {
        let pool = self.pool.clone();
        let completed = tokio::task::spawn_blocking(move || -> Result<OrderWithItems, ApiError> {
            let mut conn = get_conn(&pool)?;

            let order = Order::find_by_id(&mut conn, order_id)?
                .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

            let is_party =
                acting_user_id == order.creator_id || Some(acting_user_id) == order.accepter_id;
            if !is_party {
                return Err(ApiError::Forbidden(
                    "Only creator or accepter can complete the order".to_string(),
                ));
            }

            let updated = Order::complete(&mut conn, order_id, Utc::now().naive_utc())?;
            if updated == 0 {
                return Err(ApiError::InvalidState(format!(
                    "Cannot complete order in {} status",
                    current_status(&mut conn, order_id)?
                )));
            }

            let order = Order::find_by_id(&mut conn, order_id)?
                .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;
            attach_items(&mut conn, order)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??;

        info!(order_id, acting_user_id, "Order completed");
        Ok(completed)
    }

    /// Delete a PENDING order; creator only. Items go with it.
    pub async fn delete(&self, order_id: i32, acting_user_id: i32) -> Result<(), ApiError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<(), ApiError> {
            let mut conn = get_conn(&pool)?;

            conn.transaction::<(), ApiError, _>(|conn| {
                let order = Order::find_by_id(conn, order_id)?
                    .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

                if order.creator_id != acting_user_id {
                    return Err(ApiError::Forbidden(
                        "Only the creator can delete an order".to_string(),
                    ));
                }

                // An escrow record references the order row; deleting out
                // from under it would trip the foreign key.
                if EscrowRecord::find_by_order(conn, order_id)?.is_some() {
                    return Err(ApiError::InvalidState(
                        "Cannot delete an order with an escrow".to_string(),
                    ));
                }

                let deleted = Order::delete_pending(conn, order_id)?;
                if deleted == 0 {
                    return Err(ApiError::InvalidState(format!(
                        "Cannot delete order in {} status",
                        order.status
                    )));
                }
                OrderItem::delete_for_order(conn, order_id)?;
                Ok(())
            })
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??;

        info!(order_id, acting_user_id, "Order deleted");
        Ok(())
    }

    /// Issue a fresh share token (creator only). The previous token stops
    /// working, any revocation is cleared, and the expiry is reset per
    /// `expiry_days` (0 or absent means no expiry).
    pub async fn generate_share_token(
        &self,
        order_id: i32,
        acting_user_id: i32,
        expiry_days: Option<i64>,
    ) -> Result<Order, ApiError> {
        let now = Utc::now().naive_utc();
        let expires_at = expiry_from_days(expiry_days, now)?;
        let token = new_share_token();

        let pool = self.pool.clone();
        let order = tokio::task::spawn_blocking(move || -> Result<Order, ApiError> {
            let mut conn = get_conn(&pool)?;

            let order = Order::find_by_id(&mut conn, order_id)?
                .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

            if order.creator_id != acting_user_id {
                return Err(ApiError::Forbidden(
                    "Only the creator can generate a share link".to_string(),
                ));
            }

            Ok(Order::set_share_token(&mut conn, order_id, &token, expires_at)?)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??;

        info!(order_id, acting_user_id, "Share token regenerated");
        Ok(order)
    }

    /// Permanently disable the current share token (creator only).
    /// Distinct from expiry: revocation is immediate and manual.
    pub async fn revoke_share_token(
        &self,
        order_id: i32,
        acting_user_id: i32,
    ) -> Result<(), ApiError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<(), ApiError> {
            let mut conn = get_conn(&pool)?;

            let order = Order::find_by_id(&mut conn, order_id)?
                .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

            if order.creator_id != acting_user_id {
                return Err(ApiError::Forbidden(
                    "Only the creator can revoke a share link".to_string(),
                ));
            }

            Order::revoke_share_token(&mut conn, order_id)?;
            Ok(())
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??;

        info!(order_id, acting_user_id, "Share token revoked");
        Ok(())
    }

    /// Orders the user participates in, optionally narrowed to one role.
    pub async fn user_orders(
        &self,
        user_id: i32,
        role: Option<String>,
    ) -> Result<Vec<OrderWithItems>, ApiError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<OrderWithItems>, ApiError> {
            let mut conn = get_conn(&pool)?;
            let orders = Order::for_user(&mut conn, user_id, role.as_deref())?;
            attach_items_many(&mut conn, orders)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))?
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Generate an unguessable URL-safe share token (192 bits of entropy).
fn new_share_token() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// 0 or absent means no expiry; N > 0 means now + N days.
fn expiry_from_days(
    days: Option<i64>,
    now: NaiveDateTime,
) -> Result<Option<NaiveDateTime>, ApiError> {
    match days {
        None | Some(0) => Ok(None),
        Some(d) if d < 0 => Err(ApiError::BadRequest(
            "Expiry days must be non-negative".to_string(),
        )),
        Some(d) => Ok(Some(now + Duration::days(d))),
    }
}

fn validate_items(items: &[ItemInput]) -> Result<(), ApiError> {
    if items.is_empty() {
        return Err(ApiError::BadRequest(
            "Offering and requesting items cannot be empty".to_string(),
        ));
    }
    for item in items {
        if item.name.trim().is_empty() {
            return Err(ApiError::BadRequest("Item name is required".to_string()));
        }
        if item.category.trim().is_empty() {
            return Err(ApiError::BadRequest("Item category is required".to_string()));
        }
        if item.quantity < 1 {
            return Err(ApiError::BadRequest(
                "Item quantity must be at least 1".to_string(),
            ));
        }
    }
    Ok(())
}

/// Share-token gate for a private order. Checks run in order: presence
/// and exact match (403), revocation (410), then expiry (410) — a revoked
/// token stays revoked even before its expiry date.
fn check_share_token(order: &Order, presented: Option<&str>) -> Result<(), ApiError> {
    match (presented, order.share_token.as_deref()) {
        (Some(presented), Some(expected)) if presented == expected => {}
        _ => {
            return Err(ApiError::Forbidden(
                "A valid share token is required for this private order".to_string(),
            ))
        }
    }

    if order.share_token_revoked {
        return Err(ApiError::Revoked("Share link has been revoked".to_string()));
    }

    if let Some(expires_at) = order.share_token_expires_at {
        if Utc::now().naive_utc() > expires_at {
            return Err(ApiError::Expired("Share link has expired".to_string()));
        }
    }

    Ok(())
}

fn current_status(conn: &mut SqliteConnection, order_id: i32) -> Result<String, ApiError> {
    Ok(Order::find_by_id(conn, order_id)?
        .map(|o| o.status)
        .unwrap_or_else(|| "UNKNOWN".to_string()))
}

fn attach_items(conn: &mut SqliteConnection, order: Order) -> Result<OrderWithItems, ApiError> {
    let items = OrderItem::for_order(conn, order.id)?;
    Ok(split_items(order, items))
}

fn attach_items_many(
    conn: &mut SqliteConnection,
    orders: Vec<Order>,
) -> Result<Vec<OrderWithItems>, ApiError> {
    let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let mut remaining = OrderItem::for_orders(conn, &ids)?;

    Ok(orders
        .into_iter()
        .map(|order| {
            let (mine, rest): (Vec<OrderItem>, Vec<OrderItem>) = std::mem::take(&mut remaining)
                .into_iter()
                .partition(|i| i.order_id == order.id);
            remaining = rest;
            split_items(order, mine)
        })
        .collect())
}

fn split_items(order: Order, items: Vec<OrderItem>) -> OrderWithItems {
    let (offering_items, requesting_items) = items
        .into_iter()
        .partition(|i| i.side == ItemSide::Offering.as_str());
    OrderWithItems {
        order,
        offering_items,
        requesting_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_tokens_are_long_and_unique() {
        let a = new_share_token();
        let b = new_share_token();
        assert_ne!(a, b);
        // 24 bytes base64url without padding
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn expiry_days_semantics() {
        let now = Utc::now().naive_utc();
        assert_eq!(expiry_from_days(None, now).unwrap(), None);
        assert_eq!(expiry_from_days(Some(0), now).unwrap(), None);
        assert!(expiry_from_days(Some(-1), now).is_err());

        let exp = expiry_from_days(Some(7), now).unwrap().unwrap();
        assert_eq!(exp, now + Duration::days(7));
    }
}
