//! Ethereum address format validation
//!
//! Addresses arrive from wallets in mixed (EIP-55) case; the database
//! stores them lowercase and every identity comparison happens on the
//! normalized form, which is what makes wallet matching case-insensitive
//! across the whole API.

use anyhow::{bail, Result};

/// Check that a string is `0x` followed by exactly 40 hex characters.
pub fn is_eth_address(address: &str) -> bool {
    let Some(hex_part) = address.strip_prefix("0x") else {
        return false;
    };
    hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate an address and return its canonical lowercase form.
pub fn normalize_eth_address(address: &str) -> Result<String> {
    if !is_eth_address(address) {
        bail!("Invalid Ethereum address: {address}");
    }
    Ok(address.to_ascii_lowercase())
}
