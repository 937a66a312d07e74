//! Cryptographic verification helpers

pub mod siwe;
