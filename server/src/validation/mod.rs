//! Input format validation

pub mod address;
pub mod chain;

pub use address::{is_eth_address, normalize_eth_address};
pub use chain::{is_amount_string, is_tx_hash};
