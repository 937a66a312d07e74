//! Chain-adjacent value formats: transaction hashes and amounts

/// Check a transaction hash: `0x` followed by exactly 64 hex characters.
pub fn is_tx_hash(tx_hash: &str) -> bool {
    let Some(hex_part) = tx_hash.strip_prefix("0x") else {
        return false;
    };
    hex_part.len() == 64 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Check an amount: a non-empty base-10 integer string (smallest unit,
/// e.g. wei). String-encoded because token amounts overflow i64.
pub fn is_amount_string(amount: &str) -> bool {
    !amount.is_empty() && amount.chars().all(|c| c.is_ascii_digit())
}
