//! Hex string helpers shared by keys, signatures and keystore documents
//!
//! Every value crossing the public API is a hex string. Inputs may carry a
//! `0x` prefix (either case); outputs always use a lowercase `0x` prefix.

use alloy_primitives::{Address, B256};

use crate::error::{CryptoError, CryptoResult};

/// Remove a leading `0x` or `0X` if present.
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Prefix an already-encoded hex body with `0x`.
pub fn add_hex_prefix(body: &str) -> String {
    format!("0x{}", strip_hex_prefix(body))
}

/// Decode a hex string, tolerating the prefix and an odd nibble count.
///
/// Odd-length input is left-padded with a single zero nibble so `"0x1"`
/// decodes to `[0x01]`.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let body = strip_hex_prefix(value);
    if body.len() % 2 == 1 {
        hex::decode(format!("0{}", body))
    } else {
        hex::decode(body)
    }
}

/// Drop leading zero nibbles from a hex string, keeping at least one digit.
///
/// `"0x0001"` becomes `"0x1"` and `"0x00"` becomes `"0x0"`. An empty body
/// stays empty.
pub fn trim_leading_zeros(value: &str) -> String {
    let body = strip_hex_prefix(value);
    if body.is_empty() {
        return "0x".to_string();
    }
    let trimmed = body.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", trimmed)
    }
}

/// Render an address as `0x` + 40 lowercase hex chars.
pub fn address_to_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Parse a 20-byte address, case-insensitively.
pub fn parse_address(value: &str) -> CryptoResult<Address> {
    let body = strip_hex_prefix(value);
    if body.len() != 40 {
        return Err(CryptoError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            body.len()
        )));
    }
    let bytes = hex::decode(body).map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
    Ok(Address::from_slice(&bytes))
}

/// Parse a 32-byte hash such as a transaction or message digest.
pub fn parse_hash(value: &str) -> CryptoResult<B256> {
    let body = strip_hex_prefix(value);
    if body.len() != 64 {
        return Err(CryptoError::InvalidHash(format!(
            "expected 64 hex characters, got {}",
            body.len()
        )));
    }
    let bytes = hex::decode(body).map_err(|e| CryptoError::InvalidHash(e.to_string()))?;
    Ok(B256::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hex_pads_odd_length() {
        assert_eq!(decode_hex("0x1").unwrap(), vec![0x01]);
        assert_eq!(decode_hex("abc").unwrap(), vec![0x0a, 0xbc]);
        assert_eq!(decode_hex("0x").unwrap(), Vec::<u8>::new());
        assert!(decode_hex("0xzz").is_err());
    }

    #[test]
    fn test_trim_leading_zeros() {
        assert_eq!(trim_leading_zeros("0x0001"), "0x1");
        assert_eq!(trim_leading_zeros("0x00"), "0x0");
        assert_eq!(trim_leading_zeros("0x"), "0x");
        assert_eq!(trim_leading_zeros("0x0fe6"), "0xfe6");
    }

    #[test]
    fn test_parse_address_is_case_insensitive() {
        let lower = parse_address("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap();
        let mixed = parse_address("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf").unwrap();
        let bare = parse_address("7E5F4552091A69125D5DFCB7B8C2659029395BDF").unwrap();

        assert_eq!(lower, mixed);
        assert_eq!(lower, bare);
        assert_eq!(
            address_to_hex(&mixed),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_parse_address_rejects_bad_length() {
        assert!(matches!(
            parse_address("0x1234"),
            Err(CryptoError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_parse_hash() {
        let hash = parse_hash(&format!("0x{}", "ab".repeat(32))).unwrap();
        assert_eq!(hash.as_slice(), &[0xab; 32]);
        assert!(parse_hash("0x1234").is_err());
    }
}
