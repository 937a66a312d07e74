//! Configuration for the marketplace server

pub mod chain;
pub mod session;

pub use chain::ChainConfig;
pub use session::SessionConfig;
