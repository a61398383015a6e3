//! Keyrings: private keys bound to one account address
//!
//! Three topologies share one capability set:
//!
//! - **single**: one key answering every role
//! - **multiple**: up to 10 keys bound to the transaction role and reachable
//!   from every role
//! - **role-based**: three groups of up to 10 keys, one per [`RoleGroup`]
//!
//! Requesting `AccountUpdate` or `FeePayer` keys from an empty group falls
//! back to the `Transaction` group. `Transaction` itself never falls back.
//!
//! # Example
//!
//! ```rust,ignore
//! use klaykeys_crypto::keyring::Keyring;
//! use klaykeys_crypto::keystore::KeyStoreOptions;
//! use klaykeys_crypto::RoleGroup;
//!
//! let keyring = Keyring::generate(None)?;
//! let signatures = keyring.sign(&tx_hash, 8217, RoleGroup::Transaction)?;
//!
//! let keystore = keyring.encrypt("password", &KeyStoreOptions::scrypt())?;
//! let restored = Keyring::decrypt(&keystore, "password")?;
//! ```

pub mod container;
pub mod error;
pub mod factory;
pub mod file;

use std::fmt;

use alloy_primitives::{Address, B256};
use serde::Serialize;
use tracing::debug;

pub use container::KeyringContainer;
pub use error::{KeyringError, KeyringResult};
pub use factory::{is_klaytn_wallet_key, parse_klaytn_wallet_key};
pub use file::{FileKeyStore, KeyStoreSummary};

use crate::account::{Account, AccountKey, WeightedMultiSigOptions};
use crate::encoding::address_to_hex;
use crate::keystore::{DecryptedKeys, KeyLayout, KeyStore, KeyStoreOptions, KeyringCrypto};
use crate::message::{hash_message, MessageSigned};
use crate::private_key::PrivateKey;
use crate::role::{RoleGroup, MAX_KEYS_PER_ROLE, ROLE_GROUP_COUNT};
use crate::signature::SignatureData;

/// Keyring topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyringKind {
    Single,
    Multiple,
    RoleBased,
}

impl fmt::Display for KeyringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyringKind::Single => write!(f, "single"),
            KeyringKind::Multiple => write!(f, "multiple"),
            KeyringKind::RoleBased => write!(f, "role_based"),
        }
    }
}

/// Key material of a keyring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyringKeys {
    Single(PrivateKey),
    Multiple(Vec<PrivateKey>),
    RoleBased([Vec<PrivateKey>; ROLE_GROUP_COUNT]),
}

/// Public keys shaped like the keyring that holds them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PublicKeys {
    Single(String),
    Multiple(Vec<String>),
    RoleBased(Vec<Vec<String>>),
}

/// An account address plus the private keys that sign for it.
///
/// The address is fixed at construction. `Clone` yields an independent copy
/// that can be handed to another thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyring {
    address: Address,
    keys: KeyringKeys,
}

impl Keyring {
    /// Single-key keyring. The address may differ from the key's own.
    pub fn single(address: Address, key: PrivateKey) -> Self {
        Self {
            address,
            keys: KeyringKeys::Single(key),
        }
    }

    /// Multiple-key keyring holding at most 10 keys.
    pub fn multiple(address: Address, keys: Vec<PrivateKey>) -> KeyringResult<Self> {
        check_key_count(keys.len())?;
        Ok(Self {
            address,
            keys: KeyringKeys::Multiple(keys),
        })
    }

    /// Role-based keyring from exactly three groups of at most 10 keys.
    pub fn role_based(address: Address, groups: Vec<Vec<PrivateKey>>) -> KeyringResult<Self> {
        check_role_layout(groups.iter().map(Vec::len))?;
        let groups: [Vec<PrivateKey>; ROLE_GROUP_COUNT] =
            groups
                .try_into()
                .map_err(|groups: Vec<Vec<PrivateKey>>| KeyringError::InvalidRoleCount {
                    expected: ROLE_GROUP_COUNT,
                    actual: groups.len(),
                })?;
        Ok(Self {
            address,
            keys: KeyringKeys::RoleBased(groups),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Address as `0x` + 40 lowercase hex chars
    pub fn address_hex(&self) -> String {
        address_to_hex(&self.address)
    }

    pub fn keys(&self) -> &KeyringKeys {
        &self.keys
    }

    pub fn kind(&self) -> KeyringKind {
        match self.keys {
            KeyringKeys::Single(_) => KeyringKind::Single,
            KeyringKeys::Multiple(_) => KeyringKind::Multiple,
            KeyringKeys::RoleBased(_) => KeyringKind::RoleBased,
        }
    }

    /// Total number of private keys held
    pub fn key_count(&self) -> usize {
        match &self.keys {
            KeyringKeys::Single(_) => 1,
            KeyringKeys::Multiple(keys) => keys.len(),
            KeyringKeys::RoleBased(groups) => groups.iter().map(Vec::len).sum(),
        }
    }

    /// Keys that sign for `role`, after the transaction fallback.
    pub fn keys_by_role(&self, role: RoleGroup) -> KeyringResult<&[PrivateKey]> {
        let keys: &[PrivateKey] = match &self.keys {
            KeyringKeys::Single(key) => std::slice::from_ref(key),
            KeyringKeys::Multiple(keys) => keys,
            KeyringKeys::RoleBased(groups) => {
                let own = &groups[role.index()];
                if own.is_empty() && role != RoleGroup::Transaction {
                    &groups[RoleGroup::Transaction.index()]
                } else {
                    own
                }
            }
        };

        if keys.is_empty() {
            return Err(KeyringError::NoKeyForRole(role));
        }
        Ok(keys)
    }

    /// The key at `index` within the keys for `role`.
    pub fn key_at(&self, role: RoleGroup, index: i64) -> KeyringResult<&PrivateKey> {
        let keys = self.keys_by_role(role)?;
        if index < 0 {
            return Err(KeyringError::NegativeIndex(index));
        }
        keys.get(index as usize)
            .ok_or(KeyringError::IndexOutOfRange {
                index,
                len: keys.len(),
            })
    }

    /// Sign a transaction hash with every key of `role`.
    pub fn sign(
        &self,
        hash: &B256,
        chain_id: u64,
        role: RoleGroup,
    ) -> KeyringResult<Vec<SignatureData>> {
        self.keys_by_role(role)?
            .iter()
            .map(|key| key.sign(hash, chain_id).map_err(KeyringError::from))
            .collect()
    }

    /// Sign a transaction hash with one key of `role`.
    pub fn sign_at(
        &self,
        hash: &B256,
        chain_id: u64,
        role: RoleGroup,
        index: i64,
    ) -> KeyringResult<SignatureData> {
        Ok(self.key_at(role, index)?.sign(hash, chain_id)?)
    }

    /// Sign a hash with every key of `role`, leaving `v` without a chain id.
    pub fn sign_message(&self, hash: &B256, role: RoleGroup) -> KeyringResult<Vec<SignatureData>> {
        self.keys_by_role(role)?
            .iter()
            .map(|key| key.sign_message(hash).map_err(KeyringError::from))
            .collect()
    }

    /// Sign a hash with one key of `role`, leaving `v` without a chain id.
    pub fn sign_message_at(
        &self,
        hash: &B256,
        role: RoleGroup,
        index: i64,
    ) -> KeyringResult<SignatureData> {
        Ok(self.key_at(role, index)?.sign_message(hash)?)
    }

    /// Sign with every key of `role`, `v` holding the bare y parity.
    pub fn ecsign(&self, hash: &B256, role: RoleGroup) -> KeyringResult<Vec<SignatureData>> {
        self.keys_by_role(role)?
            .iter()
            .map(|key| key.ecsign(hash).map_err(KeyringError::from))
            .collect()
    }

    /// Sign with one key of `role`, `v` holding the bare y parity.
    pub fn ecsign_at(&self, hash: &B256, role: RoleGroup, index: i64) -> KeyringResult<SignatureData> {
        Ok(self.key_at(role, index)?.ecsign(hash)?)
    }

    /// Hash `message` with the signed-message prefix and sign it with every
    /// key of `role`.
    pub fn sign_prefixed_message(
        &self,
        message: &str,
        role: RoleGroup,
    ) -> KeyringResult<MessageSigned> {
        let message_hash = hash_message(message.as_bytes());
        Ok(MessageSigned {
            message_hash,
            signatures: self.sign_message(&message_hash, role)?,
            message: message.to_string(),
        })
    }

    /// Like [`Keyring::sign_prefixed_message`] with a single key.
    pub fn sign_prefixed_message_at(
        &self,
        message: &str,
        role: RoleGroup,
        index: i64,
    ) -> KeyringResult<MessageSigned> {
        let message_hash = hash_message(message.as_bytes());
        Ok(MessageSigned {
            message_hash,
            signatures: vec![self.sign_message_at(&message_hash, role, index)?],
            message: message.to_string(),
        })
    }

    /// Whether the address differs from the one derived from the key.
    ///
    /// Multi-key keyrings are always decoupled.
    pub fn is_decoupled(&self) -> bool {
        match &self.keys {
            KeyringKeys::Single(key) => key.derived_address() != self.address,
            KeyringKeys::Multiple(_) | KeyringKeys::RoleBased(_) => true,
        }
    }

    /// Public keys in the keyring's own shape.
    pub fn public_keys(&self, compressed: bool) -> PublicKeys {
        let encode = |keys: &[PrivateKey]| -> Vec<String> {
            keys.iter().map(|key| key.public_key(compressed)).collect()
        };
        match &self.keys {
            KeyringKeys::Single(key) => PublicKeys::Single(key.public_key(compressed)),
            KeyringKeys::Multiple(keys) => PublicKeys::Multiple(encode(keys.as_slice())),
            KeyringKeys::RoleBased(groups) => PublicKeys::RoleBased(
                groups.iter().map(|group| encode(group.as_slice())).collect(),
            ),
        }
    }

    /// Account key material with default multisig policies.
    pub fn to_account(&self) -> KeyringResult<Account> {
        let options = match &self.keys {
            KeyringKeys::Single(_) => Vec::new(),
            KeyringKeys::Multiple(keys) => vec![WeightedMultiSigOptions::default_for(keys.len())],
            KeyringKeys::RoleBased(groups) => WeightedMultiSigOptions::default_for_roles(
                &groups.iter().map(Vec::len).collect::<Vec<_>>(),
            ),
        };
        self.to_account_with_options(&options)
    }

    /// Account key material with caller-supplied multisig policies.
    ///
    /// Single keyrings take no options, multiple-key keyrings one, role-based
    /// keyrings one per role.
    pub fn to_account_with_options(
        &self,
        options: &[WeightedMultiSigOptions],
    ) -> KeyringResult<Account> {
        let account_key = match &self.keys {
            KeyringKeys::Single(key) => {
                if !options.is_empty() {
                    return Err(KeyringError::InvalidOptions(
                        "single-key keyrings take no multisig options".to_string(),
                    ));
                }
                AccountKey::Public {
                    public_key: key.public_key(false),
                }
            }
            KeyringKeys::Multiple(keys) => match options {
                [option] => weighted(keys, option)?,
                _ => {
                    return Err(KeyringError::InvalidOptions(format!(
                        "multiple-key keyrings take exactly one option, got {}",
                        options.len()
                    )))
                }
            },
            KeyringKeys::RoleBased(groups) => {
                if options.len() != ROLE_GROUP_COUNT {
                    return Err(KeyringError::InvalidOptions(format!(
                        "role-based keyrings take {} options, got {}",
                        ROLE_GROUP_COUNT,
                        options.len()
                    )));
                }
                let roles = groups
                    .iter()
                    .zip(options)
                    .map(|(group, option)| match group.as_slice() {
                        [] => Ok(AccountKey::Nil),
                        [key] if option.is_empty() => Ok(AccountKey::Public {
                            public_key: key.public_key(false),
                        }),
                        keys => weighted(keys, option),
                    })
                    .collect::<KeyringResult<Vec<_>>>()?;
                AccountKey::RoleBased { roles }
            }
        };

        Ok(Account {
            address: self.address,
            account_key,
        })
    }

    /// Compact `<key>0x00<address>` export of a single-key keyring.
    pub fn klaytn_wallet_key(&self) -> KeyringResult<String> {
        match &self.keys {
            KeyringKeys::Single(key) => Ok(format!("{}0x00{}", key.to_hex(), self.address_hex())),
            _ => Err(KeyringError::UnsupportedFormat(format!(
                "wallet key export is not supported for {} keyrings",
                self.kind()
            ))),
        }
    }

    /// Encrypt into a version 4 keystore document.
    pub fn encrypt(&self, password: &str, options: &KeyStoreOptions) -> KeyringResult<KeyStore> {
        let layout = match &self.keys {
            KeyringKeys::Single(key) => KeyLayout::Flat(std::slice::from_ref(key)),
            KeyringKeys::Multiple(keys) => KeyLayout::Flat(keys),
            KeyringKeys::RoleBased(groups) => KeyLayout::RoleBased(groups),
        };
        Ok(KeyStore::encrypt_v4(&self.address, layout, password, options)?)
    }

    /// Encrypt into a version 3 keystore document. Single-key keyrings only.
    pub fn encrypt_v3(&self, password: &str, options: &KeyStoreOptions) -> KeyringResult<KeyStore> {
        match &self.keys {
            KeyringKeys::Single(key) => {
                Ok(KeyStore::encrypt_v3(&self.address, key, password, options)?)
            }
            _ => Err(KeyringError::UnsupportedFormat(format!(
                "version 3 keystores hold one key; use version 4 for {} keyrings",
                self.kind()
            ))),
        }
    }

    /// Rebuild a keyring from a keystore document.
    ///
    /// The document shape, then key and group counts, are checked before any
    /// key is derived. A flat single-record keyring keeps the stored address
    /// as is.
    pub fn decrypt(keystore: &KeyStore, password: &str) -> KeyringResult<Self> {
        keystore.validate()?;
        match &keystore.keyring {
            Some(KeyringCrypto::Flat(records)) => check_key_count(records.len())?,
            Some(KeyringCrypto::RoleBased(groups)) => {
                check_role_layout(groups.iter().map(Vec::len))?
            }
            None => {}
        }

        let (address, keys) = keystore.decrypt(password)?;
        let keyring = match keys {
            DecryptedKeys::Single(key) => Self::single(address, key),
            DecryptedKeys::Multiple(keys) => Self::multiple(address, keys)?,
            DecryptedKeys::RoleBased(groups) => Self::role_based(address, groups)?,
        };
        debug!(address = %keyring.address_hex(), kind = %keyring.kind(), "Decrypted keyring");
        Ok(keyring)
    }
}

fn weighted(keys: &[PrivateKey], option: &WeightedMultiSigOptions) -> KeyringResult<AccountKey> {
    if !option.is_valid() || option.weights.len() != keys.len() {
        return Err(KeyringError::InvalidOptions(format!(
            "threshold {} with {} weights does not fit {} keys",
            option.threshold,
            option.weights.len(),
            keys.len()
        )));
    }
    Ok(AccountKey::WeightedMultiSig {
        public_keys: keys.iter().map(|key| key.public_key(false)).collect(),
        options: option.clone(),
    })
}

pub(crate) fn check_key_count(count: usize) -> KeyringResult<()> {
    if count > MAX_KEYS_PER_ROLE {
        return Err(KeyringError::TooManyKeys {
            count,
            max: MAX_KEYS_PER_ROLE,
        });
    }
    Ok(())
}

pub(crate) fn check_role_layout<I>(group_sizes: I) -> KeyringResult<()>
where
    I: ExactSizeIterator<Item = usize>,
{
    if group_sizes.len() != ROLE_GROUP_COUNT {
        return Err(KeyringError::InvalidRoleCount {
            expected: ROLE_GROUP_COUNT,
            actual: group_sizes.len(),
        });
    }
    for size in group_sizes {
        check_key_count(size)?;
    }
    Ok(())
}
