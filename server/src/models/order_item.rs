//! Order item model
//!
//! Items are created atomically with their parent order and are immutable
//! afterwards; deletion only happens in cascade with the order.

use anyhow::{Context, Result};
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::order_items;

#[derive(Debug, Clone, Serialize, Queryable, Identifiable)]
#[diesel(table_name = order_items)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    /// OFFERING or REQUESTING.
    pub side: String,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub estimated_value: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem {
    pub order_id: i32,
    pub side: String,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub estimated_value: Option<f64>,
    pub currency: Option<String>,
}

impl OrderItem {
    pub fn insert_batch(conn: &mut SqliteConnection, items: &[NewOrderItem]) -> Result<()> {
        diesel::insert_into(order_items::table)
            .values(items)
            .execute(conn)
            .context("Failed to insert order items")?;
        Ok(())
    }

    pub fn for_order(conn: &mut SqliteConnection, order_id: i32) -> Result<Vec<OrderItem>> {
        order_items::table
            .filter(order_items::order_id.eq(order_id))
            .order(order_items::id.asc())
            .load(conn)
            .context("Failed to load order items")
    }

    pub fn for_orders(conn: &mut SqliteConnection, order_ids: &[i32]) -> Result<Vec<OrderItem>> {
        order_items::table
            .filter(order_items::order_id.eq_any(order_ids))
            .order(order_items::id.asc())
            .load(conn)
            .context("Failed to load order items")
    }

    pub fn delete_for_order(conn: &mut SqliteConnection, order_id: i32) -> Result<usize> {
        diesel::delete(order_items::table.filter(order_items::order_id.eq(order_id)))
            .execute(conn)
            .context("Failed to delete order items")
    }
}
