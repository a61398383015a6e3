//! Encryption options and their one-time resolution
//!
//! [`KeyStoreOptions`] is what callers configure. Before any key is touched it
//! is resolved into [`ResolvedOptions`]: missing salt and IV are generated
//! exactly once, and every key in the same encrypt call is sealed with those
//! fixed values.

use super::cipher::{generate_iv, IV_LENGTH};
use super::error::{KeystoreError, KeystoreResult};
use super::kdf::{generate_salt, KdfKind, KdfParams, Pbkdf2Params, ScryptParams, DKLEN};
use super::kdf::{PBKDF2_C, PBKDF2_PRF, SCRYPT_N, SCRYPT_P, SCRYPT_R};

/// Caller-facing encryption options
///
/// # Example
///
/// ```rust
/// use klaykeys_crypto::keystore::KeyStoreOptions;
///
/// let options = KeyStoreOptions::pbkdf2().iterations(1000);
/// let resolved = options.resolve().unwrap();
/// assert_eq!(resolved.kdf_kind().name(), "pbkdf2");
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyStoreOptions {
    kdf: KdfKind,
    salt: Option<Vec<u8>>,
    iv: Option<Vec<u8>>,
    dklen: Option<u32>,
    n: Option<u32>,
    r: Option<u32>,
    p: Option<u32>,
    c: Option<u32>,
}

impl KeyStoreOptions {
    /// scrypt with default parameters
    pub fn scrypt() -> Self {
        Self::default()
    }

    /// PBKDF2-HMAC-SHA256 with default parameters
    pub fn pbkdf2() -> Self {
        Self {
            kdf: KdfKind::Pbkdf2,
            ..Self::default()
        }
    }

    pub fn with_kdf(kdf: KdfKind) -> Self {
        Self {
            kdf,
            ..Self::default()
        }
    }

    /// Use a fixed salt instead of a random one
    pub fn salt(mut self, salt: &[u8]) -> Self {
        self.salt = Some(salt.to_vec());
        self
    }

    /// Use a fixed IV instead of a random one
    pub fn iv(mut self, iv: &[u8]) -> Self {
        self.iv = Some(iv.to_vec());
        self
    }

    pub fn dklen(mut self, dklen: u32) -> Self {
        self.dklen = Some(dklen);
        self
    }

    /// scrypt cost parameters
    pub fn scrypt_cost(mut self, n: u32, r: u32, p: u32) -> Self {
        self.n = Some(n);
        self.r = Some(r);
        self.p = Some(p);
        self
    }

    /// PBKDF2 iteration count
    pub fn iterations(mut self, c: u32) -> Self {
        self.c = Some(c);
        self
    }

    pub fn kdf(&self) -> KdfKind {
        self.kdf
    }

    /// Fix salt and IV, generating whichever is missing, and validate.
    pub fn resolve(&self) -> KeystoreResult<ResolvedOptions> {
        let salt = self.salt.clone().unwrap_or_else(generate_salt);
        let iv = self.iv.clone().unwrap_or_else(generate_iv);

        if iv.len() != IV_LENGTH {
            return Err(KeystoreError::InvalidCipherParams(format!(
                "IV must be {} bytes, got {}",
                IV_LENGTH,
                iv.len()
            )));
        }

        let dklen = self.dklen.unwrap_or(DKLEN);
        let kdfparams = match self.kdf {
            KdfKind::Scrypt => KdfParams::Scrypt(ScryptParams {
                dklen,
                n: self.n.unwrap_or(SCRYPT_N),
                p: self.p.unwrap_or(SCRYPT_P),
                r: self.r.unwrap_or(SCRYPT_R),
                salt: hex::encode(&salt),
            }),
            KdfKind::Pbkdf2 => KdfParams::Pbkdf2(Pbkdf2Params {
                dklen,
                c: self.c.unwrap_or(PBKDF2_C),
                prf: PBKDF2_PRF.to_string(),
                salt: hex::encode(&salt),
            }),
        };
        kdfparams.validate()?;

        Ok(ResolvedOptions { kdfparams, iv })
    }
}

/// Options with salt and IV pinned; shared by every key of one encrypt call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    kdfparams: KdfParams,
    iv: Vec<u8>,
}

impl ResolvedOptions {
    pub fn kdfparams(&self) -> &KdfParams {
        &self.kdfparams
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn kdf_kind(&self) -> KdfKind {
        self.kdfparams.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_generates_salt_and_iv_once() {
        let options = KeyStoreOptions::scrypt();
        let a = options.resolve().unwrap();
        let b = options.resolve().unwrap();

        assert_eq!(a.iv().len(), IV_LENGTH);
        // Each resolution draws fresh randomness
        assert_ne!(a.iv(), b.iv());
        assert_ne!(a.kdfparams(), b.kdfparams());
    }

    #[test]
    fn test_resolve_keeps_fixed_values() {
        let options = KeyStoreOptions::pbkdf2()
            .salt(&[0x01; 32])
            .iv(&[0x02; 16])
            .iterations(1000);
        let resolved = options.resolve().unwrap();

        assert_eq!(resolved.iv(), &[0x02; 16]);
        match resolved.kdfparams() {
            KdfParams::Pbkdf2(params) => {
                assert_eq!(params.c, 1000);
                assert_eq!(params.salt, hex::encode([0x01; 32]));
                assert_eq!(params.prf, "hmac-sha256");
            }
            other => panic!("unexpected params: {:?}", other),
        }
        assert_eq!(resolved, options.resolve().unwrap());
    }

    #[test]
    fn test_resolve_defaults() {
        let resolved = KeyStoreOptions::scrypt().resolve().unwrap();
        match resolved.kdfparams() {
            KdfParams::Scrypt(params) => {
                assert_eq!((params.n, params.r, params.p, params.dklen), (4096, 8, 1, 32));
                assert_eq!(params.salt.len(), 64);
            }
            other => panic!("unexpected params: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_rejects_bad_iv() {
        let result = KeyStoreOptions::scrypt().iv(&[0x01; 4]).resolve();
        assert!(matches!(result, Err(KeystoreError::InvalidCipherParams(_))));
    }

    #[test]
    fn test_resolve_rejects_bad_cost() {
        let result = KeyStoreOptions::scrypt().scrypt_cost(1000, 8, 1).resolve();
        assert!(matches!(result, Err(KeystoreError::InvalidKdfParams(_))));
    }
}
