//! HTTP handlers
//!
//! Thin translation layer between actix-web and the services: extract the
//! session identity, deserialize the request, call a service, serialize
//! the response. All business rules live in `crate::services`.

pub mod auth;
pub mod auth_helpers;
pub mod escrow;
pub mod orders;
pub mod user;
