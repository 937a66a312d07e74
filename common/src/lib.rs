//! Barter Marketplace Shared Types
//!
//! This crate provides the domain enums shared between:
//! - the marketplace server (Rust)
//! - scripts and integration tests
//!
//! All types serialize to the wire format the REST API speaks
//! (SCREAMING_SNAKE_CASE status strings) and round-trip through
//! their database TEXT representation via `as_str` / `FromStr`.

pub mod types;

pub use types::*;
