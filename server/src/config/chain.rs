//! Escrow contract configuration
//!
//! The server never talks to the chain itself; it only records which
//! contract and network escrows refer to. The contract address is
//! validated once at startup so a typo fails fast instead of being
//! written into every escrow record.

use anyhow::{Context, Result};

use crate::validation::address::normalize_eth_address;

pub const DEFAULT_CHAIN: &str = "sepolia";

/// On-chain escrow configuration shared with every handler.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Deployed escrow contract address (lowercase hex), if configured.
    pub contract_address: Option<String>,
    /// Network name recorded on escrow rows (e.g. "sepolia", "mainnet").
    pub chain: String,
}

impl ChainConfig {
    /// Load from `ESCROW_CONTRACT_ADDRESS` and `ESCROW_CHAIN`.
    pub fn from_env() -> Result<Self> {
        let contract_address = match std::env::var("ESCROW_CONTRACT_ADDRESS") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                normalize_eth_address(raw.trim())
                    .context("ESCROW_CONTRACT_ADDRESS is not a valid Ethereum address")?,
            ),
            _ => None,
        };

        let chain = std::env::var("ESCROW_CHAIN")
            .ok()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CHAIN.to_string());

        Ok(Self {
            contract_address,
            chain,
        })
    }
}
