//! Database models and row-level operations
//!
//! Each model owns its diesel queries as associated functions taking a
//! `&mut SqliteConnection`, so services can compose them inside a single
//! transaction. Status transitions are conditional updates
//! (`WHERE status = <expected>`): under concurrency at most one caller
//! wins and the loser sees zero rows affected.

pub mod escrow_record;
pub mod order;
pub mod order_item;
pub mod user;

pub use escrow_record::{EscrowRecord, NewEscrowRecord};
pub use order::{NewOrder, Order};
pub use order_item::{NewOrderItem, OrderItem};
pub use user::{NewUser, User};
