//! Integration tests for keyring encryption and signing
//!
//! These tests drive the public API the way a wallet would:
//! - Encrypt every keyring shape under every KDF and keystore version
//! - Serialize to JSON, parse back, decrypt
//! - Sign through the restored keyring and recover the signer

use alloy_primitives::{keccak256, Address};
use klaykeys_crypto::keyring::{Keyring, KeyringKeys};
use klaykeys_crypto::keystore::{KeyStore, KeyStoreOptions, KeystoreError};
use klaykeys_crypto::{recover, FileKeyStore, KeyringError, PrivateKey, RoleGroup};
use tempfile::TempDir;

fn scrypt_options() -> KeyStoreOptions {
    // Low cost keeps the grid fast; the format is identical
    KeyStoreOptions::scrypt().scrypt_cost(1024, 8, 1)
}

fn pbkdf2_options() -> KeyStoreOptions {
    KeyStoreOptions::pbkdf2().iterations(1024)
}

fn fresh_keys(n: usize) -> Vec<PrivateKey> {
    (0..n).map(|_| PrivateKey::generate(None).unwrap()).collect()
}

fn sample_keyrings() -> Vec<Keyring> {
    let single_key = PrivateKey::generate(None).unwrap();
    vec![
        Keyring::single(single_key.derived_address(), single_key),
        Keyring::single(Address::repeat_byte(0x5a), PrivateKey::generate(None).unwrap()),
        Keyring::multiple(Address::repeat_byte(0x6b), fresh_keys(3)).unwrap(),
        Keyring::role_based(
            Address::repeat_byte(0x7c),
            vec![fresh_keys(2), Vec::new(), fresh_keys(3)],
        )
        .unwrap(),
    ]
}

fn hex_by_role(keyring: &Keyring) -> Vec<Vec<String>> {
    let hex = |keys: &[PrivateKey]| keys.iter().map(PrivateKey::to_hex).collect::<Vec<_>>();
    match keyring.keys() {
        KeyringKeys::Single(key) => vec![vec![key.to_hex()]],
        KeyringKeys::Multiple(keys) => vec![hex(keys.as_slice())],
        KeyringKeys::RoleBased(groups) => groups.iter().map(|g| hex(g.as_slice())).collect(),
    }
}

/// Every KDF, every keyring shape, every legal version
#[test]
fn test_round_trip_grid() {
    for options in [scrypt_options(), pbkdf2_options()] {
        for keyring in sample_keyrings() {
            let mut documents = vec![keyring.encrypt("password", &options).unwrap()];
            if matches!(keyring.keys(), KeyringKeys::Single(_)) {
                documents.push(keyring.encrypt_v3("password", &options).unwrap());
            }

            for document in documents {
                let json = document.to_json().unwrap();
                let parsed = KeyStore::from_json(&json).unwrap();
                let restored = Keyring::decrypt(&parsed, "password").unwrap();

                assert_eq!(restored.address(), keyring.address());
                assert_eq!(hex_by_role(&restored), hex_by_role(&keyring));
                assert_eq!(restored.kind(), keyring.kind());
            }
        }
    }
}

#[test]
fn test_wrong_password_fails_closed_for_every_shape() {
    for keyring in sample_keyrings() {
        let document = keyring.encrypt("pw1", &pbkdf2_options()).unwrap();
        assert!(matches!(
            Keyring::decrypt(&document, "pw2"),
            Err(KeyringError::Keystore(KeystoreError::InvalidPassword))
        ));
    }
}

/// Generate, encrypt under PBKDF2, JSON round trip, decrypt
#[test]
fn test_end_to_end_pbkdf2() {
    let keyring = Keyring::generate(None).unwrap();
    let address = keyring.address();
    let key_hex = match keyring.keys() {
        KeyringKeys::Single(key) => key.to_hex(),
        other => panic!("generated keyring is not single: {:?}", other),
    };

    let document = keyring.encrypt("password", &KeyStoreOptions::pbkdf2()).unwrap();
    let json = document.to_json().unwrap();
    assert!(json.contains("\"kdf\": \"pbkdf2\""));
    assert!(json.contains("\"c\": 262144"));
    assert!(json.contains("\"prf\": \"hmac-sha256\""));

    let parsed = KeyStore::from_json(&json).unwrap();
    let restored = Keyring::decrypt(&parsed, "password").unwrap();

    assert_eq!(restored.address(), address);
    match restored.keys() {
        KeyringKeys::Single(key) => assert_eq!(key.to_hex(), key_hex),
        other => panic!("restored keyring is not single: {:?}", other),
    }
}

#[test]
fn test_legacy_uppercase_crypto_field() {
    let keyring = Keyring::generate(None).unwrap();
    let document = keyring.encrypt_v3("password", &scrypt_options()).unwrap();
    let json = document.to_json().unwrap().replace("\"crypto\"", "\"Crypto\"");

    let parsed = KeyStore::from_json(&json).unwrap();
    assert!(parsed.crypto.is_some());
    assert_eq!(Keyring::decrypt(&parsed, "password").unwrap(), keyring);

    // Re-serialized documents use the lowercase name
    assert!(parsed.to_json().unwrap().contains("\"crypto\""));
}

#[test]
fn test_sign_with_restored_keyring() {
    let keyring = Keyring::role_based(
        Address::repeat_byte(0x01),
        vec![fresh_keys(1), fresh_keys(2), Vec::new()],
    )
    .unwrap();
    let document = keyring.encrypt("password", &scrypt_options()).unwrap();
    let restored = Keyring::decrypt(&document, "password").unwrap();

    let hash = keccak256(b"fee-delegated tx");
    let original = keyring.sign(&hash, 8217, RoleGroup::FeePayer).unwrap();
    let again = restored.sign(&hash, 8217, RoleGroup::FeePayer).unwrap();

    // Fee payer falls back to the transaction key; RFC 6979 makes signing deterministic
    assert_eq!(original, again);
    assert_eq!(original.len(), 1);
    assert_eq!(original[0].chain_id(), Some(8217));

    let KeyringKeys::RoleBased(groups) = restored.keys() else {
        panic!("restored keyring is not role-based");
    };
    assert_eq!(recover(&hash, &original[0]).unwrap(), groups[0][0].derived_address());
}

#[test]
fn test_file_store_with_mixed_versions() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileKeyStore::new(&temp_dir.path().join("keystore")).unwrap();

    for keyring in sample_keyrings() {
        store.save(&keyring.encrypt("password", &scrypt_options()).unwrap()).unwrap();
    }
    let summaries = store.list().unwrap();
    assert_eq!(summaries.len(), 4);

    let key_counts: Vec<usize> = summaries.iter().map(|s| s.key_count).collect();
    assert_eq!(key_counts.iter().sum::<usize>(), 1 + 1 + 3 + 5);

    for summary in summaries {
        let address = klaykeys_crypto::encoding::parse_address(&summary.address).unwrap();
        let restored = Keyring::decrypt(&store.load(&address).unwrap(), "password").unwrap();
        assert_eq!(restored.key_count(), summary.key_count);
    }
}

#[test]
fn test_known_address_vector() {
    let key = PrivateKey::from_hex(
        "0x45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8",
    )
    .unwrap();
    let expected: Address = "0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b".parse().unwrap();

    assert_eq!(key.derived_address(), expected);
    assert_eq!(key.derived_address(), key.derived_address());
}
