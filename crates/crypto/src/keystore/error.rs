//! Keystore error types

use thiserror::Error;

/// Result type for keystore operations
pub type KeystoreResult<T> = Result<T, KeystoreError>;

/// Errors that can occur while encrypting or decrypting a keystore
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// MAC mismatch: wrong password or tampered ciphertext
    #[error("invalid password")]
    InvalidPassword,

    /// PBKDF2 pseudo-random function other than hmac-sha256
    #[error("unsupported prf: {0}")]
    UnsupportedPrf(String),

    /// KDF name not recognised
    #[error("unsupported KDF: {0}")]
    UnsupportedKdf(String),

    /// Cipher name not recognised
    #[error("unsupported cipher: {0}")]
    UnsupportedCipher(String),

    /// Invalid KDF parameters
    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    /// Invalid cipher parameters
    #[error("invalid cipher parameters: {0}")]
    InvalidCipherParams(String),

    /// Key derivation failed
    #[error("key derivation failed: {0}")]
    KdfError(String),

    /// AES-level failure
    #[error("cipher error: {0}")]
    CipherError(String),

    /// Document violates the version/crypto/keyring invariants
    #[error("invalid keystore format: {0}")]
    InvalidFormat(String),

    /// Decrypted payload is not a valid private key
    #[error("decrypted key is invalid: {0}")]
    Key(#[from] crate::error::CryptoError),

    /// Hex decoding error
    #[error("hex decoding error: {0}")]
    HexError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
