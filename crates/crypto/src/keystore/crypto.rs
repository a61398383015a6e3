//! The per-key `Crypto` record and the build/open pipeline around it

use secrecy::ExposeSecret;
use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::trace;
use zeroize::Zeroizing;

use super::cipher::{decrypt_secret, encrypt_secret, CipherParams, CIPHER_NAME};
use super::error::{KeystoreError, KeystoreResult};
use super::kdf::{KdfKind, KdfParams};
use super::mac::{compute_mac, verify_mac};
use super::options::ResolvedOptions;
use crate::encoding::strip_hex_prefix;
use crate::private_key::{PrivateKey, PRIVATE_KEY_LENGTH};
use crate::secure::SecretBytes;

/// One encrypted private key
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Crypto {
    /// Cipher identifier, always `aes-128-ctr`
    pub cipher: String,
    /// Encrypted key as hex string
    pub ciphertext: String,
    pub cipherparams: CipherParams,
    /// `scrypt` or `pbkdf2`
    pub kdf: String,
    pub kdfparams: KdfParams,
    /// keccak256 MAC as hex string
    pub mac: String,
}

impl<'de> Deserialize<'de> for Crypto {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawCrypto {
            cipher: String,
            ciphertext: String,
            cipherparams: CipherParams,
            kdf: String,
            kdfparams: serde_json::Value,
            mac: String,
        }

        let raw = RawCrypto::deserialize(deserializer)?;
        let kind: KdfKind = raw.kdf.parse().map_err(de::Error::custom)?;
        let kdfparams = KdfParams::from_value(kind, raw.kdfparams).map_err(de::Error::custom)?;

        Ok(Self {
            cipher: raw.cipher,
            ciphertext: raw.ciphertext,
            cipherparams: raw.cipherparams,
            kdf: raw.kdf,
            kdfparams,
            mac: raw.mac,
        })
    }
}

impl Crypto {
    /// Seal one key with an already derived key.
    fn seal(
        key: &PrivateKey,
        derived_key: &[u8],
        options: &ResolvedOptions,
    ) -> KeystoreResult<Self> {
        let plaintext = key.to_bytes();
        let ciphertext = encrypt_secret(&plaintext[..], derived_key, options.iv())?;
        let mac = compute_mac(derived_key, &ciphertext)?;

        Ok(Self {
            cipher: CIPHER_NAME.to_string(),
            ciphertext: hex::encode(&ciphertext),
            cipherparams: CipherParams::new(options.iv()),
            kdf: options.kdf_kind().name().to_string(),
            kdfparams: options.kdfparams().clone(),
            mac: hex::encode(mac),
        })
    }

    /// KDF named by the `kdf` field, checked against the parameter shape.
    pub fn kdf_kind(&self) -> KeystoreResult<KdfKind> {
        let named: KdfKind = self.kdf.parse()?;
        if named != self.kdfparams.kind() {
            return Err(KeystoreError::InvalidKdfParams(format!(
                "kdf is {} but kdfparams describe {}",
                named,
                self.kdfparams.kind()
            )));
        }
        Ok(named)
    }

    /// Derive the key for this record from `password`.
    pub fn derive_key(&self, password: &str) -> KeystoreResult<SecretBytes> {
        self.kdf_kind()?;
        self.kdfparams.derive_key(password)
    }

    /// Verify the MAC and decrypt with an already derived key.
    ///
    /// The MAC is checked before AES runs; on mismatch no plaintext is produced.
    pub fn open(&self, derived_key: &[u8]) -> KeystoreResult<PrivateKey> {
        if !self.cipher.eq_ignore_ascii_case(CIPHER_NAME) {
            return Err(KeystoreError::UnsupportedCipher(self.cipher.clone()));
        }

        let ciphertext = hex::decode(strip_hex_prefix(&self.ciphertext))
            .map_err(|e| KeystoreError::HexError(format!("invalid ciphertext hex: {}", e)))?;
        let mac = hex::decode(strip_hex_prefix(&self.mac))
            .map_err(|e| KeystoreError::HexError(format!("invalid mac hex: {}", e)))?;

        verify_mac(derived_key, &ciphertext, &mac)?;

        let iv = self.cipherparams.iv()?;
        let plaintext = decrypt_secret(&ciphertext, derived_key, &iv)?;
        let plaintext = plaintext.expose_secret();
        if plaintext.len() > PRIVATE_KEY_LENGTH {
            return Err(KeystoreError::InvalidFormat(format!(
                "decrypted key is {} bytes",
                plaintext.len()
            )));
        }

        let mut scalar = Zeroizing::new([0u8; PRIVATE_KEY_LENGTH]);
        scalar[PRIVATE_KEY_LENGTH - plaintext.len()..].copy_from_slice(plaintext);
        Ok(PrivateKey::from_bytes(&scalar)?)
    }

    /// Derive, verify and decrypt.
    pub fn decrypt(&self, password: &str) -> KeystoreResult<PrivateKey> {
        let derived_key = self.derive_key(password)?;
        self.open(derived_key.expose_secret())
    }
}

/// Encrypt every key under one password and one resolved option set.
///
/// Salt and IV are shared, so the key is derived once and reused.
pub fn build_crypto(
    keys: &[PrivateKey],
    password: &str,
    options: &ResolvedOptions,
) -> KeystoreResult<Vec<Crypto>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let derived_key = options.kdfparams().derive_key(password)?;
    trace!(count = keys.len(), kdf = %options.kdf_kind(), "Sealing keys");

    keys.iter()
        .map(|key| Crypto::seal(key, derived_key.expose_secret(), options))
        .collect()
}

/// Decrypt a batch of records, deriving once per distinct KDF parameter set.
pub fn decrypt_crypto(records: &[Crypto], password: &str) -> KeystoreResult<Vec<PrivateKey>> {
    let mut derived: Vec<(&KdfParams, SecretBytes)> = Vec::new();
    let mut keys = Vec::with_capacity(records.len());

    for record in records {
        let index = match derived.iter().position(|(params, _)| *params == &record.kdfparams) {
            Some(index) => index,
            None => {
                derived.push((&record.kdfparams, record.derive_key(password)?));
                derived.len() - 1
            }
        };
        keys.push(record.open(derived[index].1.expose_secret())?);
    }

    Ok(keys)
}
