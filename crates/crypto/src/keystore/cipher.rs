//! AES-128-CTR encryption of private key payloads
//!
//! Only the first 16 bytes of the derived key feed AES. The second half is
//! reserved for the MAC.

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use serde::{Deserialize, Serialize};

use super::error::{KeystoreError, KeystoreResult};
use crate::encoding::strip_hex_prefix;
use crate::secure::{IntoSecret, SecretBytes};

/// Cipher identifier written to the `cipher` field
pub const CIPHER_NAME: &str = "aes-128-ctr";

/// IV (initialization vector) length for AES-128-CTR
pub const IV_LENGTH: usize = 16;

/// AES-128 key length
pub const AES_KEY_LENGTH: usize = 16;

type Aes128Ctr = Ctr128BE<Aes128>;

/// `cipherparams` of a `Crypto` record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CipherParams {
    /// Initialization vector as hex string
    pub iv: String,
}

impl CipherParams {
    pub fn new(iv: &[u8]) -> Self {
        Self {
            iv: hex::encode(iv),
        }
    }

    /// Decoded IV, checked for length
    pub fn iv(&self) -> KeystoreResult<Vec<u8>> {
        let iv = hex::decode(strip_hex_prefix(&self.iv))
            .map_err(|e| KeystoreError::InvalidCipherParams(format!("invalid IV hex: {}", e)))?;
        if iv.len() != IV_LENGTH {
            return Err(KeystoreError::InvalidCipherParams(format!(
                "IV must be {} bytes, got {}",
                IV_LENGTH,
                iv.len()
            )));
        }
        Ok(iv)
    }
}

fn keystream(derived_key: &[u8], iv: &[u8]) -> KeystoreResult<Aes128Ctr> {
    if derived_key.len() < AES_KEY_LENGTH {
        return Err(KeystoreError::CipherError(format!(
            "derived key must be at least {} bytes, got {}",
            AES_KEY_LENGTH,
            derived_key.len()
        )));
    }
    Aes128Ctr::new_from_slices(&derived_key[..AES_KEY_LENGTH], iv)
        .map_err(|_| KeystoreError::CipherError(format!("IV must be {} bytes", IV_LENGTH)))
}

/// Encrypt `plaintext` with AES-128-CTR under `derived_key[..16]`.
pub fn encrypt_secret(plaintext: &[u8], derived_key: &[u8], iv: &[u8]) -> KeystoreResult<Vec<u8>> {
    let mut cipher = keystream(derived_key, iv)?;
    let mut ciphertext = plaintext.to_vec();
    cipher.apply_keystream(&mut ciphertext);
    Ok(ciphertext)
}

/// Decrypt `ciphertext` with AES-128-CTR under `derived_key[..16]`.
///
/// Callers verify the MAC first; this function cannot detect a wrong key.
pub fn decrypt_secret(
    ciphertext: &[u8],
    derived_key: &[u8],
    iv: &[u8],
) -> KeystoreResult<SecretBytes> {
    let mut cipher = keystream(derived_key, iv)?;
    let mut plaintext = ciphertext.to_vec();
    cipher.apply_keystream(&mut plaintext);
    Ok(plaintext.into_secret())
}

/// Generate a random IV
pub fn generate_iv() -> Vec<u8> {
    use rand::RngCore;
    let mut iv = vec![0u8; IV_LENGTH];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}
