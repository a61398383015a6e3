//! Account keyrings and encrypted keystores for Klaytn
//!
//! This crate provides:
//! - secp256k1 private keys, transaction and message signing
//! - Signature triples with chain-id aware `v` and their wire list encoding
//! - Single, multiple and role-based keyrings bound to an account address
//! - Version 3 and version 4 keystore documents (scrypt or PBKDF2, AES-128-CTR)
//! - An in-memory keyring container and a file-backed keystore directory

pub mod account;
pub mod encoding;
pub mod error;
pub mod keyring;
pub mod keystore;
pub mod message;
pub mod private_key;
pub mod role;
pub mod secure;
pub mod signature;

// Key and signature exports
pub use private_key::{PrivateKey, PRIVATE_KEY_LENGTH};
pub use signature::SignatureData;
pub use message::{hash_message, recover, MessageSigned, MESSAGE_PREFIX};

// Role exports
pub use role::{RoleGroup, MAX_KEYS_PER_ROLE, ROLE_GROUP_COUNT};

// Account exports
pub use account::{Account, AccountKey, WeightedMultiSigOptions};

// Error exports
pub use error::{CryptoError, CryptoResult};

// Secure memory exports
pub use secure::{IntoSecret, SecretBytes};

// Keystore exports
pub use keystore::{KdfKind, KeyStore, KeyStoreOptions, KeystoreError};

// Keyring exports
pub use keyring::{
    FileKeyStore, KeyStoreSummary, Keyring, KeyringContainer, KeyringError, KeyringKeys,
    KeyringKind, KeyringResult, PublicKeys,
};
