//! Order model and status transitions
//!
//! The order row carries both the barter lifecycle (status, accepter,
//! timestamps) and a denormalized mirror of its escrow record
//! (escrow_id/address/status/tx_hash). Transition functions return the
//! number of rows affected; zero means the precondition no longer held
//! when the update ran, which callers surface as an invalid-state error.

use anyhow::{Context, Result};
use barter_marketplace_common::OrderStatus;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::orders;

#[derive(Debug, Clone, Serialize, Queryable, Identifiable)]
#[diesel(table_name = orders)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub direction: String,
    pub status: String,
    pub creator_id: i32,
    pub accepter_id: Option<i32>,
    pub accepted_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub is_private: bool,
    pub share_token: Option<String>,
    pub share_token_expires_at: Option<NaiveDateTime>,
    pub share_token_revoked: bool,
    pub escrow_id: Option<i32>,
    pub escrow_address: Option<String>,
    pub escrow_status: Option<String>,
    pub escrow_tx_hash: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub title: String,
    pub description: Option<String>,
    pub direction: String,
    pub status: String,
    pub creator_id: i32,
    pub is_private: bool,
    pub share_token: Option<String>,
    pub share_token_expires_at: Option<NaiveDateTime>,
}

/// Filters for the public listing endpoint.
#[derive(Debug, Clone, Default)]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    pub include_private: bool,
    pub limit: i64,
    pub offset: i64,
}

impl Order {
    pub fn create(conn: &mut SqliteConnection, new_order: &NewOrder) -> Result<Order> {
        diesel::insert_into(orders::table)
            .values(new_order)
            .get_result(conn)
            .context("Failed to insert order")
    }

    pub fn find_by_id(conn: &mut SqliteConnection, order_id: i32) -> Result<Option<Order>> {
        orders::table
            .find(order_id)
            .first(conn)
            .optional()
            .context("Failed to load order")
    }

    /// List orders newest-first with the public-visibility rules applied.
    /// Returns the page plus the total row count under the same filters.
    pub fn list(conn: &mut SqliteConnection, filter: &OrderListFilter) -> Result<(Vec<Order>, i64)> {
        let mut query = orders::table.into_boxed();
        let mut count_query = orders::table.into_boxed();

        if !filter.include_private {
            query = query.filter(orders::is_private.eq(false));
            count_query = count_query.filter(orders::is_private.eq(false));
        }
        if let Some(status) = filter.status {
            query = query.filter(orders::status.eq(status.as_str()));
            count_query = count_query.filter(orders::status.eq(status.as_str()));
        }

        let total: i64 = count_query
            .count()
            .get_result(conn)
            .context("Failed to count orders")?;

        let rows = query
            .order(orders::created_at.desc())
            .then_order_by(orders::id.desc())
            .limit(filter.limit)
            .offset(filter.offset)
            .load(conn)
            .context("Failed to list orders")?;

        Ok((rows, total))
    }

    /// Orders where the user participates. `role` narrows to one side.
    pub fn for_user(
        conn: &mut SqliteConnection,
        user_id: i32,
        role: Option<&str>,
    ) -> Result<Vec<Order>> {
        let mut query = orders::table.into_boxed();

        query = match role {
            Some("creator") => query.filter(orders::creator_id.eq(user_id)),
            Some("accepter") => query.filter(orders::accepter_id.eq(user_id)),
            _ => query.filter(
                orders::creator_id
                    .eq(user_id)
                    .or(orders::accepter_id.eq(user_id)),
            ),
        };

        query
            .order(orders::created_at.desc())
            .then_order_by(orders::id.desc())
            .load(conn)
            .context("Failed to load user orders")
    }

    /// PENDING → ACCEPTED, binding the accepter. Conditional on PENDING so
    /// two concurrent accepts cannot both win.
    pub fn accept(
        conn: &mut SqliteConnection,
        order_id: i32,
        accepter_id: i32,
        now: NaiveDateTime,
    ) -> Result<usize> {
        diesel::update(
            orders::table
                .find(order_id)
                .filter(orders::status.eq(OrderStatus::Pending.as_str())),
        )
        .set((
            orders::status.eq(OrderStatus::Accepted.as_str()),
            orders::accepter_id.eq(accepter_id),
            orders::accepted_at.eq(now),
        ))
        .execute(conn)
        .context("Failed to accept order")
    }

    /// ACCEPTED → COMPLETED.
    pub fn complete(conn: &mut SqliteConnection, order_id: i32, now: NaiveDateTime) -> Result<usize> {
        diesel::update(
            orders::table
                .find(order_id)
                .filter(orders::status.eq(OrderStatus::Accepted.as_str())),
        )
        .set((
            orders::status.eq(OrderStatus::Completed.as_str()),
            orders::completed_at.eq(now),
        ))
        .execute(conn)
        .context("Failed to complete order")
    }

    /// Delete a still-PENDING order row. Items are removed by the caller
    /// in the same transaction.
    pub fn delete_pending(conn: &mut SqliteConnection, order_id: i32) -> Result<usize> {
        diesel::delete(
            orders::table
                .find(order_id)
                .filter(orders::status.eq(OrderStatus::Pending.as_str())),
        )
        .execute(conn)
        .context("Failed to delete order")
    }

    /// Install a new share token, replacing any previous one and clearing
    /// the revoked flag.
    pub fn set_share_token(
        conn: &mut SqliteConnection,
        order_id: i32,
        token: &str,
        expires_at: Option<NaiveDateTime>,
    ) -> Result<Order> {
        diesel::update(orders::table.find(order_id))
            .set((
                orders::share_token.eq(token),
                orders::share_token_expires_at.eq(expires_at),
                orders::share_token_revoked.eq(false),
            ))
            .get_result(conn)
            .context("Failed to set share token")
    }

    /// Permanently disable the current share token.
    pub fn revoke_share_token(conn: &mut SqliteConnection, order_id: i32) -> Result<usize> {
        diesel::update(orders::table.find(order_id))
            .set(orders::share_token_revoked.eq(true))
            .execute(conn)
            .context("Failed to revoke share token")
    }

    // ------------------------------------------------------------------
    // Escrow mirror writes. Always called inside the same transaction as
    // the escrow_records mutation so the two copies cannot diverge.
    // ------------------------------------------------------------------

    pub fn mirror_escrow_created(
        conn: &mut SqliteConnection,
        order_id: i32,
        escrow_record_id: i32,
        contract_address: &str,
        escrow_status: &str,
    ) -> Result<usize> {
        diesel::update(orders::table.find(order_id))
            .set((
                orders::escrow_id.eq(escrow_record_id),
                orders::escrow_address.eq(contract_address),
                orders::escrow_status.eq(escrow_status),
            ))
            .execute(conn)
            .context("Failed to mirror escrow creation onto order")
    }

    pub fn mirror_escrow_status(
        conn: &mut SqliteConnection,
        order_id: i32,
        escrow_status: &str,
        tx_hash: Option<&str>,
    ) -> Result<usize> {
        match tx_hash {
            Some(tx) => diesel::update(orders::table.find(order_id))
                .set((
                    orders::escrow_status.eq(escrow_status),
                    orders::escrow_tx_hash.eq(tx),
                ))
                .execute(conn),
            None => diesel::update(orders::table.find(order_id))
                .set(orders::escrow_status.eq(escrow_status))
                .execute(conn),
        }
        .context("Failed to mirror escrow status onto order")
    }

    /// Escrow acceptance also advances the order itself: the accepter is
    /// bound and the order moves to ACCEPTED. The one escrow path that
    /// touches the order's primary status.
    pub fn mirror_escrow_accepted(
        conn: &mut SqliteConnection,
        order_id: i32,
        accepter_id: i32,
        now: NaiveDateTime,
        tx_hash: Option<&str>,
    ) -> Result<usize> {
        let base = diesel::update(orders::table.find(order_id));
        match tx_hash {
            Some(tx) => base
                .set((
                    orders::escrow_status.eq(barter_marketplace_common::EscrowStatus::Accepted.as_str()),
                    orders::status.eq(OrderStatus::Accepted.as_str()),
                    orders::accepter_id.eq(accepter_id),
                    orders::accepted_at.eq(now),
                    orders::escrow_tx_hash.eq(tx),
                ))
                .execute(conn),
            None => base
                .set((
                    orders::escrow_status.eq(barter_marketplace_common::EscrowStatus::Accepted.as_str()),
                    orders::status.eq(OrderStatus::Accepted.as_str()),
                    orders::accepter_id.eq(accepter_id),
                    orders::accepted_at.eq(now),
                ))
                .execute(conn),
        }
        .context("Failed to mirror escrow acceptance onto order")
    }

    pub fn mirror_escrow_completed(
        conn: &mut SqliteConnection,
        order_id: i32,
        now: NaiveDateTime,
        tx_hash: &str,
    ) -> Result<usize> {
        diesel::update(orders::table.find(order_id))
            .set((
                orders::escrow_status.eq(barter_marketplace_common::EscrowStatus::Completed.as_str()),
                orders::status.eq(OrderStatus::Completed.as_str()),
                orders::completed_at.eq(now),
                orders::escrow_tx_hash.eq(tx_hash),
            ))
            .execute(conn)
            .context("Failed to mirror escrow completion onto order")
    }
}
