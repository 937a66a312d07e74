//! Log sanitization helpers
//!
//! Wallet addresses and transaction hashes are pseudonymous identifiers;
//! logging them whole allows trivial correlation across log lines and
//! with public chain data. Truncated forms keep enough to debug with.

/// Truncate an Ethereum address for logs.
///
/// Format: "0x1234…cdef" (first 6 + last 4 chars).
pub fn sanitize_address(address: &str) -> String {
    if address.len() < 12 {
        return "<invalid-address>".to_string();
    }
    format!("{}…{}", &address[..6], &address[address.len() - 4..])
}

/// Truncate a transaction hash for logs.
///
/// Format: "0xabc123…90ef" (first 8 + last 4 chars).
pub fn sanitize_txid(txid: &str) -> String {
    if txid.len() < 16 {
        return "<invalid-txid>".to_string();
    }
    format!("{}…{}", &txid[..8], &txid[txid.len() - 4..])
}
