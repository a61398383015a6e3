//! Encrypted keystore codec
//!
//! This module seals private keys into versioned JSON keystore documents
//! and opens them again.
//!
//! # Security Properties
//!
//! - **KDF**: scrypt (n=4096, r=8, p=1) or PBKDF2-HMAC-SHA256 (c=262144)
//! - **Cipher**: AES-128-CTR keyed with the first half of the derived key
//! - **MAC**: keccak256(derived_key[16..32] || ciphertext), checked before decryption
//! - **File permissions**: 0600 (owner read/write only)
//!
//! # Example
//!
//! ```rust,ignore
//! use klaykeys_crypto::keystore::{KeyLayout, KeyStore, KeyStoreOptions};
//!
//! let keystore = KeyStore::encrypt_v4(&address, KeyLayout::Flat(&keys), "password", &KeyStoreOptions::pbkdf2())?;
//! keystore.save("/path/to/keystore.json")?;
//!
//! let loaded = KeyStore::load("/path/to/keystore.json")?;
//! let (address, keys) = loaded.decrypt("password")?;
//! ```

mod cipher;
mod crypto;
mod document;
mod error;
mod kdf;
mod mac;
mod options;

pub use cipher::{decrypt_secret, encrypt_secret, CipherParams, CIPHER_NAME, IV_LENGTH};
pub use crypto::{build_crypto, decrypt_crypto, Crypto};
pub use document::{
    DecryptedKeys, KeyLayout, KeyStore, KeyringCrypto, KEYSTORE_VERSION_3, KEYSTORE_VERSION_4,
};
pub use error::{KeystoreError, KeystoreResult};
pub use kdf::{
    pbkdf2_derive_key, scrypt_derive_key, KdfKind, KdfParams, Pbkdf2Params, ScryptParams,
    SALT_LENGTH,
};
pub use mac::{compute_mac, verify_mac};
pub use options::{KeyStoreOptions, ResolvedOptions};
