//! Keyring error types

use std::io;
use thiserror::Error;

use crate::role::RoleGroup;

/// Result type for keyring operations
pub type KeyringResult<T> = Result<T, KeyringError>;

/// Errors that can occur during keyring operations
#[derive(Error, Debug)]
pub enum KeyringError {
    /// A key slot holds more keys than allowed
    #[error("too many keys: {count} exceeds the maximum of {max}")]
    TooManyKeys { count: usize, max: usize },

    /// Role-based keyrings need exactly one group per role
    #[error("role-based keyring needs {expected} role groups, got {actual}")]
    InvalidRoleCount { expected: usize, actual: usize },

    /// Key index below zero
    #[error("invalid index {0}: index must be 0 or greater")]
    NegativeIndex(i64),

    /// Key index past the end of the resolved role group
    #[error("invalid index {index}: role group has {len} keys")]
    IndexOutOfRange { index: i64, len: usize },

    /// Neither the role nor the transaction fallback holds a key
    #[error("no key defined for role {0}")]
    NoKeyForRole(RoleGroup),

    /// Operation not legal for this keyring variant
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Malformed wallet key string
    #[error("invalid wallet key: {0}")]
    InvalidWalletKey(String),

    /// Multisig options do not fit the keys they describe
    #[error("invalid multisig options: {0}")]
    InvalidOptions(String),

    /// No keyring stored for this address
    #[error("keyring not found: {0}")]
    KeyringNotFound(String),

    /// A keyring for this address is already stored
    #[error("keyring already exists: {0}")]
    DuplicateKeyring(String),

    /// Key or signature error
    #[error(transparent)]
    Crypto(#[from] crate::error::CryptoError),

    /// Underlying keystore error
    #[error(transparent)]
    Keystore(#[from] crate::keystore::KeystoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
