//! Cryptographic error types

use thiserror::Error;

/// Result type for key and signature operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by private key and signature handling
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Malformed or out-of-range private key material
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// Malformed signature, or an operation applied to a placeholder signature
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Address string is not 20 bytes of hex
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Hash input is not 32 bytes of hex
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    /// ECDSA signing failed
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Public key recovery failed
    #[error("public key recovery failed: {0}")]
    RecoveryFailed(String),
}
