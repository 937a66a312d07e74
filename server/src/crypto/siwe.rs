//! Sign-In-With-Ethereum (EIP-4361) message handling
//!
//! The client signs a structured plain-text message containing a
//! server-issued nonce. We extract the address and nonce from the message,
//! then recover the EIP-191 `personal_sign` signer and require it to match
//! the address the message claims. Nonce consumption happens at the user
//! model, not here.

use alloy::primitives::PrimitiveSignature;
use thiserror::Error;

use crate::validation::address::is_eth_address;

#[derive(Debug, Error)]
pub enum SiweError {
    #[error("Could not extract address or nonce from message")]
    MalformedMessage,

    #[error("Malformed signature")]
    MalformedSignature,

    #[error("Signature does not match the message address")]
    SignerMismatch,
}

/// Fields recovered from an EIP-4361 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiweFields {
    /// Lowercase wallet address from the message's address line.
    pub address: String,
    /// Server-issued nonce echoed back in the message.
    pub nonce: String,
}

/// Extract the address line and `Nonce:` field from a SIWE message.
///
/// Per EIP-4361 the address is the sole content of the second line, but
/// wallets disagree on surrounding whitespace, so any line that is exactly
/// an address is accepted.
pub fn parse_message(message: &str) -> Result<SiweFields, SiweError> {
    let mut address = None;
    let mut nonce = None;

    for line in message.lines() {
        let line = line.trim();
        if address.is_none() && is_eth_address(line) {
            address = Some(line.to_ascii_lowercase());
        }
        if nonce.is_none() {
            if let Some(rest) = line.strip_prefix("Nonce:") {
                let value = rest.trim();
                if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()) {
                    nonce = Some(value.to_string());
                }
            }
        }
    }

    match (address, nonce) {
        (Some(address), Some(nonce)) => Ok(SiweFields { address, nonce }),
        _ => Err(SiweError::MalformedMessage),
    }
}

/// Verify an EIP-191 `personal_sign` signature over `message`.
///
/// Recovers the signer from the signature and compares it, lowercased,
/// against `expected_address` (already lowercase).
pub fn verify_signature(
    message: &str,
    signature: &str,
    expected_address: &str,
) -> Result<(), SiweError> {
    let signature: PrimitiveSignature = signature
        .parse()
        .map_err(|_| SiweError::MalformedSignature)?;

    let recovered = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|_| SiweError::MalformedSignature)?;

    let recovered_hex = format!("0x{}", hex::encode(recovered.as_slice()));
    if recovered_hex != expected_address {
        return Err(SiweError::SignerMismatch);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    fn sample_message(address: &str, nonce: &str) -> String {
        format!(
            "localhost:3000 wants you to sign in with your Ethereum account:\n\
             {address}\n\
             \n\
             Sign in to the barter marketplace.\n\
             \n\
             URI: http://localhost:3000\n\
             Version: 1\n\
             Chain ID: 11155111\n\
             Nonce: {nonce}\n\
             Issued At: 2025-06-10T12:00:00Z"
        )
    }

    #[test]
    fn parses_address_and_nonce() {
        let msg = sample_message("0xAbCdEfabcdefABCDEFabcdefabcdefABCDEFabcd", "k3VqyT9zHxW4bPn2R");
        let fields = parse_message(&msg).unwrap();
        assert_eq!(fields.address, "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd");
        assert_eq!(fields.nonce, "k3VqyT9zHxW4bPn2R");
    }

    #[test]
    fn rejects_message_without_nonce() {
        let msg = "localhost wants you to sign in:\n0x1234567890123456789012345678901234567890\n";
        assert!(matches!(
            parse_message(msg),
            Err(SiweError::MalformedMessage)
        ));
    }

    #[test]
    fn verifies_real_signature() {
        let signer = PrivateKeySigner::random();
        let address = format!("0x{}", hex::encode(signer.address().as_slice()));
        let msg = sample_message(&address, "abc123def456");

        let sig = signer.sign_message_sync(msg.as_bytes()).unwrap();
        let sig_hex = format!("0x{}", hex::encode(sig.as_bytes()));

        verify_signature(&msg, &sig_hex, &address).unwrap();
    }

    #[test]
    fn rejects_signature_from_other_key() {
        let signer = PrivateKeySigner::random();
        let other = PrivateKeySigner::random();
        let address = format!("0x{}", hex::encode(signer.address().as_slice()));
        let msg = sample_message(&address, "abc123def456");

        let sig = other.sign_message_sync(msg.as_bytes()).unwrap();
        let sig_hex = format!("0x{}", hex::encode(sig.as_bytes()));

        assert!(matches!(
            verify_signature(&msg, &sig_hex, &address),
            Err(SiweError::SignerMismatch)
        ));
    }

    #[test]
    fn rejects_garbage_signature() {
        let msg = sample_message("0x1234567890123456789012345678901234567890", "abcdef123");
        assert!(matches!(
            verify_signature(&msg, "0xdeadbeef", "0x1234567890123456789012345678901234567890"),
            Err(SiweError::MalformedSignature)
        ));
    }
}
