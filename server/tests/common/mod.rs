//! Shared helpers for integration tests
//!
//! Each test gets its own file-backed SQLite database under the system
//! temp dir (in-memory SQLite is per-connection, which does not survive
//! an r2d2 pool), with migrations applied on creation.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};

use actix_web::cookie::Key;
use server::config::{ChainConfig, SessionConfig};
use server::db::{create_pool, run_migrations, DbPool};
use server::models::order::OrderListFilter;
use server::models::User;
use server::services::orders::{CreateOrderInput, ItemInput};
use barter_marketplace_common::TradeDirection;

static DB_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Create a fresh migrated pool on a unique temp database file.
pub fn test_pool() -> DbPool {
    let n = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!(
        "barter_test_{}_{}.db",
        std::process::id(),
        n
    ));
    let _ = std::fs::remove_file(&path);

    let pool = create_pool(path.to_str().expect("temp path is utf-8")).expect("create test pool");
    run_migrations(&pool).expect("run migrations");
    pool
}

pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        cookie_name: "p2p_session".to_string(),
        ttl_days: 7,
        cookie_secure: false,
        key: Key::generate(),
    }
}

pub fn test_chain_config() -> ChainConfig {
    ChainConfig {
        contract_address: Some("0x00000000000000000000000000000000000000e5".to_string()),
        chain: "sepolia".to_string(),
    }
}

/// Insert (or fetch) a user for a wallet address.
pub fn seed_user(pool: &DbPool, wallet: &str) -> User {
    let mut conn = pool.get().expect("get connection");
    User::get_or_create_by_wallet(&mut conn, &wallet.to_lowercase()).expect("seed user")
}

pub fn item(name: &str, category: &str) -> ItemInput {
    ItemInput {
        name: name.to_string(),
        description: None,
        quantity: 1,
        unit: None,
        category: category.to_string(),
        estimated_value: None,
        currency: None,
    }
}

/// A plain public SELL order offering a book for an iPad.
pub fn book_for_ipad() -> CreateOrderInput {
    CreateOrderInput {
        title: "Trade my book for an iPad".to_string(),
        description: Some("Hardly used textbook, looking for a tablet".to_string()),
        direction: TradeDirection::Sell,
        offering_items: vec![item("Calculus textbook", "books")],
        requesting_items: vec![item("iPad", "electronics")],
        is_private: false,
        expiry_days: None,
    }
}

pub fn private_order() -> CreateOrderInput {
    CreateOrderInput {
        is_private: true,
        expiry_days: Some(7),
        ..book_for_ipad()
    }
}

pub fn default_filter() -> OrderListFilter {
    OrderListFilter {
        status: None,
        include_private: false,
        limit: 20,
        offset: 0,
    }
}
