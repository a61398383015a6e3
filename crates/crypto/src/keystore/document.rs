//! Versioned keystore documents
//!
//! Version 3 holds exactly one `crypto` record. Version 4 holds `keyring`,
//! which is either a flat array of records (single or multiple keys) or an
//! array of three arrays (role-based). The JSON shape alone decides which.

use std::fs;
use std::path::Path;

use alloy_primitives::Address;
use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::crypto::{build_crypto, decrypt_crypto, Crypto};
use super::error::{KeystoreError, KeystoreResult};
use super::options::KeyStoreOptions;
use crate::encoding::{address_to_hex, parse_address};
use crate::private_key::PrivateKey;
use crate::role::ROLE_GROUP_COUNT;

/// Legacy single-key format
pub const KEYSTORE_VERSION_3: u32 = 3;

/// Keyring format
pub const KEYSTORE_VERSION_4: u32 = 4;

/// Encrypted keys of a version 4 document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum KeyringCrypto {
    /// `[Crypto, ...]`
    Flat(Vec<Crypto>),
    /// `[[Crypto, ...], [...], [...]]`
    RoleBased(Vec<Vec<Crypto>>),
}

impl KeyringCrypto {
    /// Total number of encrypted keys
    pub fn key_count(&self) -> usize {
        match self {
            KeyringCrypto::Flat(records) => records.len(),
            KeyringCrypto::RoleBased(groups) => groups.iter().map(Vec::len).sum(),
        }
    }
}

impl<'de> Deserialize<'de> for KeyringCrypto {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let first_is_array = match value.as_array() {
            Some(items) => items.first().is_some_and(serde_json::Value::is_array),
            None => return Err(de::Error::custom("keyring must be a JSON array")),
        };

        if first_is_array {
            serde_json::from_value(value)
                .map(KeyringCrypto::RoleBased)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(KeyringCrypto::Flat)
                .map_err(de::Error::custom)
        }
    }
}

/// Key layout to encrypt into a version 4 document
#[derive(Debug, Clone, Copy)]
pub enum KeyLayout<'a> {
    Flat(&'a [PrivateKey]),
    RoleBased(&'a [Vec<PrivateKey>]),
}

/// Keys recovered from a document, shaped before any keyring is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptedKeys {
    Single(PrivateKey),
    Multiple(Vec<PrivateKey>),
    RoleBased(Vec<Vec<PrivateKey>>),
}

/// A keystore document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStore {
    pub version: u32,
    pub id: String,
    /// Account address as stored, normally `0x` + 40 hex chars
    pub address: String,
    /// Version 3 payload; older tools wrote it as `Crypto`
    #[serde(default, alias = "Crypto", skip_serializing_if = "Option::is_none")]
    pub crypto: Option<Crypto>,
    /// Version 4 payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyring: Option<KeyringCrypto>,
}

impl KeyStore {
    /// Encrypt one key into a version 3 document.
    pub fn encrypt_v3(
        address: &Address,
        key: &PrivateKey,
        password: &str,
        options: &KeyStoreOptions,
    ) -> KeystoreResult<Self> {
        let resolved = options.resolve()?;
        let mut records = build_crypto(std::slice::from_ref(key), password, &resolved)?;
        debug!(kdf = %resolved.kdf_kind(), "Encrypted version 3 keystore");

        Ok(Self {
            version: KEYSTORE_VERSION_3,
            id: Uuid::new_v4().to_string(),
            address: address_to_hex(address),
            crypto: records.pop(),
            keyring: None,
        })
    }

    /// Encrypt a key layout into a version 4 document.
    ///
    /// Role groups keep their position; unused roles become empty arrays.
    /// A flat layout needs at least one key.
    pub fn encrypt_v4(
        address: &Address,
        layout: KeyLayout<'_>,
        password: &str,
        options: &KeyStoreOptions,
    ) -> KeystoreResult<Self> {
        if let KeyLayout::Flat([]) = layout {
            return Err(KeystoreError::InvalidFormat(
                "keyring must not be empty".to_string(),
            ));
        }
        let resolved = options.resolve()?;

        let keyring = match layout {
            KeyLayout::Flat(keys) => KeyringCrypto::Flat(build_crypto(keys, password, &resolved)?),
            KeyLayout::RoleBased(groups) => {
                // One derivation serves every group; seal them as a single batch.
                let all: Vec<PrivateKey> = groups.iter().flatten().cloned().collect();
                let mut sealed = build_crypto(&all, password, &resolved)?.into_iter();
                KeyringCrypto::RoleBased(
                    groups
                        .iter()
                        .map(|group| sealed.by_ref().take(group.len()).collect())
                        .collect(),
                )
            }
        };
        debug!(
            kdf = %resolved.kdf_kind(),
            keys = keyring.key_count(),
            "Encrypted version 4 keystore"
        );

        Ok(Self {
            version: KEYSTORE_VERSION_4,
            id: Uuid::new_v4().to_string(),
            address: address_to_hex(address),
            crypto: None,
            keyring: Some(keyring),
        })
    }

    /// Check the version against the `crypto`/`keyring` fields.
    pub fn validate(&self) -> KeystoreResult<()> {
        match (self.version, &self.crypto, &self.keyring) {
            (KEYSTORE_VERSION_3, Some(_), None) => Ok(()),
            (KEYSTORE_VERSION_3, None, _) => Err(KeystoreError::InvalidFormat(
                "version 3 keystore requires crypto".to_string(),
            )),
            (KEYSTORE_VERSION_3, Some(_), Some(_)) => Err(KeystoreError::InvalidFormat(
                "version 3 keystore must not carry keyring".to_string(),
            )),
            (KEYSTORE_VERSION_4, None, Some(keyring)) => match keyring {
                KeyringCrypto::Flat(records) if records.is_empty() => Err(
                    KeystoreError::InvalidFormat("keyring must not be empty".to_string()),
                ),
                KeyringCrypto::RoleBased(groups) if groups.len() != ROLE_GROUP_COUNT => {
                    Err(KeystoreError::InvalidFormat(format!(
                        "role-based keyring must have {} groups, got {}",
                        ROLE_GROUP_COUNT,
                        groups.len()
                    )))
                }
                _ => Ok(()),
            },
            (KEYSTORE_VERSION_4, _, None) => Err(KeystoreError::InvalidFormat(
                "version 4 keystore requires keyring".to_string(),
            )),
            (KEYSTORE_VERSION_4, Some(_), Some(_)) => Err(KeystoreError::InvalidFormat(
                "version 4 keystore must not carry crypto".to_string(),
            )),
            (version, _, _) => Err(KeystoreError::InvalidFormat(format!(
                "unsupported keystore version {}",
                version
            ))),
        }
    }

    /// Stored address, parsed.
    pub fn parsed_address(&self) -> KeystoreResult<Address> {
        parse_address(&self.address).map_err(|e| KeystoreError::InvalidFormat(e.to_string()))
    }

    /// Decrypt every record, failing closed on the first bad MAC.
    pub fn decrypt(&self, password: &str) -> KeystoreResult<(Address, DecryptedKeys)> {
        self.validate()?;
        let address = self.parsed_address()?;
        debug!(version = self.version, address = %self.address, "Decrypting keystore");

        let keys = match (&self.crypto, &self.keyring) {
            (Some(crypto), _) => DecryptedKeys::Single(crypto.decrypt(password)?),
            (None, Some(KeyringCrypto::Flat(records))) => {
                let mut keys = decrypt_crypto(records, password)?;
                match keys.len() {
                    1 => DecryptedKeys::Single(keys.remove(0)),
                    _ => DecryptedKeys::Multiple(keys),
                }
            }
            (None, Some(KeyringCrypto::RoleBased(groups))) => {
                let all: Vec<Crypto> = groups.iter().flatten().cloned().collect();
                let mut opened = decrypt_crypto(&all, password)?.into_iter();
                DecryptedKeys::RoleBased(
                    groups
                        .iter()
                        .map(|group| opened.by_ref().take(group.len()).collect())
                        .collect(),
                )
            }
            (None, None) => {
                return Err(KeystoreError::InvalidFormat(
                    "keystore carries no key material".to_string(),
                ))
            }
        };

        Ok((address, keys))
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> KeystoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document. Shape invariants are checked on decrypt.
    pub fn from_json(json: &str) -> KeystoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write to `path` with owner-only permissions.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> KeystoreResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_json()?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Read a document from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> KeystoreResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
