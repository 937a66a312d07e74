//! Barter marketplace server library
//!
//! REST backend for listing and negotiating peer-to-peer barter orders,
//! with Sign-In-With-Ethereum authentication and off-chain bookkeeping
//! for an external escrow contract.

/// Truncate a wallet address for logging.
#[macro_export]
macro_rules! log_address {
    ($addr:expr) => {
        $crate::logging::sanitize::sanitize_address($addr)
    };
}

/// Truncate a transaction hash for logging.
#[macro_export]
macro_rules! log_txid {
    ($txid:expr) => {
        $crate::logging::sanitize::sanitize_txid($txid)
    };
}

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod schema;
pub mod services;
pub mod validation;
