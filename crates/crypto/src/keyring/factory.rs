//! Keyring construction from fresh randomness, hex keys and wallet keys

use alloy_primitives::Address;
use tracing::debug;

use super::error::{KeyringError, KeyringResult};
use super::{check_key_count, check_role_layout, Keyring};
use crate::encoding::{parse_address, strip_hex_prefix};
use crate::error::CryptoError;
use crate::private_key::{PrivateKey, PRIVATE_KEY_LENGTH};

/// Wallet key length without the leading `0x`: key, `0x00`, `0x` + address
const WALLET_KEY_LENGTH: usize = PRIVATE_KEY_LENGTH * 2 + 4 + 42;

/// Flag between key and address; `00` is the only defined value
const WALLET_KEY_FLAG: &str = "00";

/// Generate a fresh private key, retrying the rare candidate outside the curve order.
pub fn generate_single_key(entropy: Option<&[u8]>) -> KeyringResult<String> {
    Ok(fresh_key(entropy)?.to_hex())
}

/// Generate `count` fresh private keys, at most 10.
pub fn generate_multiple_keys(count: usize, entropy: Option<&[u8]>) -> KeyringResult<Vec<String>> {
    check_key_count(count)?;
    (0..count).map(|_| generate_single_key(entropy)).collect()
}

/// Generate one group of fresh private keys per entry of `counts`.
///
/// The layout is checked before any key is drawn.
pub fn generate_role_based_keys(
    counts: &[usize],
    entropy: Option<&[u8]>,
) -> KeyringResult<Vec<Vec<String>>> {
    check_role_layout(counts.iter().copied())?;
    counts
        .iter()
        .map(|&count| generate_multiple_keys(count, entropy))
        .collect()
}

/// Whether `value` has the `<key>0x00<address>` wallet key shape and both
/// halves parse.
pub fn is_klaytn_wallet_key(value: &str) -> bool {
    parse_klaytn_wallet_key(value).is_ok()
}

/// Split a wallet key into its private key and address.
pub fn parse_klaytn_wallet_key(value: &str) -> KeyringResult<(PrivateKey, Address)> {
    let body = strip_hex_prefix(value);
    if body.len() != WALLET_KEY_LENGTH {
        return Err(KeyringError::InvalidWalletKey(format!(
            "expected {} characters after 0x, got {}",
            WALLET_KEY_LENGTH,
            body.len()
        )));
    }

    let parts: Vec<&str> = body.split("0x").collect();
    let [key, flag, address] = parts.as_slice() else {
        return Err(KeyringError::InvalidWalletKey(
            "expected <key>0x00<address>".to_string(),
        ));
    };
    if *flag != WALLET_KEY_FLAG {
        return Err(KeyringError::InvalidWalletKey(format!(
            "unknown flag 0x{}",
            flag
        )));
    }

    let key = PrivateKey::from_hex(key)
        .map_err(|e| KeyringError::InvalidWalletKey(e.to_string()))?;
    let address = parse_address(address)
        .map_err(|e| KeyringError::InvalidWalletKey(e.to_string()))?;
    Ok((key, address))
}

fn fresh_key(entropy: Option<&[u8]>) -> KeyringResult<PrivateKey> {
    loop {
        match PrivateKey::generate(entropy) {
            Ok(key) => return Ok(key),
            Err(CryptoError::InvalidKey(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn parse_keys(keys: &[&str]) -> KeyringResult<Vec<PrivateKey>> {
    keys.iter()
        .map(|key| PrivateKey::from_hex(key).map_err(KeyringError::from))
        .collect()
}

impl Keyring {
    /// Single-key keyring around a fresh key, coupled to its own address.
    pub fn generate(entropy: Option<&[u8]>) -> KeyringResult<Self> {
        let key = fresh_key(entropy)?;
        let keyring = Self::single(key.derived_address(), key);
        debug!(address = %keyring.address_hex(), "Generated keyring");
        Ok(keyring)
    }

    /// Single-key keyring from a parsed address and key.
    pub fn create(address: &str, key: &str) -> KeyringResult<Self> {
        Self::create_with_single_key(address, key)
    }

    /// Single-key keyring from a raw hex key or a wallet key.
    ///
    /// A wallet key carries its own address, which may be decoupled.
    pub fn from_private_key(value: &str) -> KeyringResult<Self> {
        if is_klaytn_wallet_key(value) {
            return Self::from_klaytn_wallet_key(value);
        }
        let key = PrivateKey::from_hex(value)?;
        Ok(Self::single(key.derived_address(), key))
    }

    /// Single-key keyring from a `<key>0x00<address>` wallet key.
    pub fn from_klaytn_wallet_key(value: &str) -> KeyringResult<Self> {
        let (key, address) = parse_klaytn_wallet_key(value)?;
        Ok(Self::single(address, key))
    }

    /// Single-key keyring for `address`. Wallet keys are rejected here.
    pub fn create_with_single_key(address: &str, key: &str) -> KeyringResult<Self> {
        if is_klaytn_wallet_key(key) {
            return Err(CryptoError::InvalidKey(
                "wallet key given where a raw private key is expected".to_string(),
            )
            .into());
        }
        let address = parse_address(address)?;
        Ok(Self::single(address, PrivateKey::from_hex(key)?))
    }

    /// Multiple-key keyring for `address`.
    pub fn create_with_multiple_keys(address: &str, keys: &[&str]) -> KeyringResult<Self> {
        check_key_count(keys.len())?;
        let address = parse_address(address)?;
        Self::multiple(address, parse_keys(keys)?)
    }

    /// Role-based keyring for `address`, one group per role.
    pub fn create_with_role_based_keys(address: &str, groups: &[Vec<&str>]) -> KeyringResult<Self> {
        check_role_layout(groups.iter().map(Vec::len))?;
        let address = parse_address(address)?;
        let groups = groups
            .iter()
            .map(|group| parse_keys(group))
            .collect::<KeyringResult<Vec<_>>>()?;
        Self::role_based(address, groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyring::KeyringKind;

    const KEY: &str = "0x45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8";
    const ADDRESS: &str = "0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b";

    fn wallet_key() -> String {
        format!("{}0x00{}", KEY, ADDRESS)
    }

    #[test]
    fn test_generated_keys_are_distinct() {
        let keys = generate_multiple_keys(3, Some(b"entropy")).unwrap();
        assert_eq!(keys.len(), 3);
        assert_ne!(keys[0], keys[1]);
        assert!(keys.iter().all(|key| key.len() == 66));

        let groups = generate_role_based_keys(&[2, 0, 1], None).unwrap();
        assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 0, 1]);
    }

    #[test]
    fn test_generation_limits() {
        assert!(matches!(
            generate_multiple_keys(11, None),
            Err(KeyringError::TooManyKeys { count: 11, max: 10 })
        ));
        assert!(matches!(
            generate_role_based_keys(&[11, 0, 0], None),
            Err(KeyringError::TooManyKeys { count: 11, .. })
        ));
        assert!(matches!(
            generate_role_based_keys(&[1, 1], None),
            Err(KeyringError::InvalidRoleCount { actual: 2, .. })
        ));
    }

    #[test]
    fn test_generate_is_coupled() {
        let keyring = Keyring::generate(None).unwrap();
        assert_eq!(keyring.kind(), KeyringKind::Single);
        assert!(!keyring.is_decoupled());
    }

    #[test]
    fn test_parse_wallet_key() {
        let (key, address) = parse_klaytn_wallet_key(&wallet_key()).unwrap();
        assert_eq!(key.to_hex(), KEY);
        assert_eq!(crate::encoding::address_to_hex(&address), ADDRESS);

        // Leading 0x is optional
        assert!(is_klaytn_wallet_key(&wallet_key()[2..]));
    }

    #[test]
    fn test_reject_malformed_wallet_keys() {
        let bad_flag = format!("{}0x01{}", KEY, ADDRESS);
        assert!(matches!(
            parse_klaytn_wallet_key(&bad_flag),
            Err(KeyringError::InvalidWalletKey(_))
        ));

        assert!(!is_klaytn_wallet_key(KEY));
        assert!(!is_klaytn_wallet_key(&format!("{}0x00{}", KEY, &ADDRESS[..40])));

        let no_separators = format!("{}0000{}", KEY, &ADDRESS[2..]);
        assert!(!is_klaytn_wallet_key(&format!("{}00", no_separators)));
    }

    #[test]
    fn test_from_private_key_detects_wallet_key() {
        let keyring = Keyring::from_private_key(&wallet_key()).unwrap();
        assert_eq!(keyring.address_hex(), ADDRESS);

        let plain = Keyring::from_private_key(KEY).unwrap();
        assert_eq!(plain.address_hex(), ADDRESS);
        assert!(!plain.is_decoupled());
    }

    #[test]
    fn test_create_with_single_key_rejects_wallet_key() {
        assert!(matches!(
            Keyring::create_with_single_key(ADDRESS, &wallet_key()),
            Err(KeyringError::Crypto(CryptoError::InvalidKey(_)))
        ));

        let keyring = Keyring::create(&ADDRESS.to_uppercase().replacen("0X", "0x", 1), KEY).unwrap();
        assert_eq!(keyring.address_hex(), ADDRESS);
    }

    #[test]
    fn test_counts_checked_before_parsing() {
        let bad = vec!["not-a-key"; 11];
        assert!(matches!(
            Keyring::create_with_multiple_keys(ADDRESS, &bad),
            Err(KeyringError::TooManyKeys { count: 11, .. })
        ));

        let groups = vec![vec!["not-a-key"]; 4];
        assert!(matches!(
            Keyring::create_with_role_based_keys(ADDRESS, &groups),
            Err(KeyringError::InvalidRoleCount { actual: 4, .. })
        ));

        assert!(matches!(
            Keyring::create_with_multiple_keys(ADDRESS, &["not-a-key"]),
            Err(KeyringError::Crypto(CryptoError::InvalidKey(_)))
        ));
    }

    #[test]
    fn test_create_role_based() {
        let groups = vec![vec![KEY], vec![], vec![KEY, KEY]];
        let keyring = Keyring::create_with_role_based_keys(ADDRESS, &groups).unwrap();
        assert_eq!(keyring.kind(), KeyringKind::RoleBased);
        assert_eq!(keyring.key_count(), 3);
    }
}
