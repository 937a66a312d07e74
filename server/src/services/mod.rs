//! Business-logic services
//!
//! Handlers stay thin; these services own the status-transition rules and
//! authorization checks, independent of the transport layer. Diesel work
//! runs on the blocking pool; anything that writes more than one row does
//! so inside a single transaction.

pub mod escrow;
pub mod orders;

pub use escrow::EscrowService;
pub use orders::OrderService;

use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::SqliteConnection;

use crate::db::DbPool;
use crate::error::ApiError;

pub(crate) type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

pub(crate) fn get_conn(pool: &DbPool) -> Result<PooledConn, ApiError> {
    pool.get()
        .map_err(|e| ApiError::Internal(format!("Failed to get DB connection: {e}")))
}
