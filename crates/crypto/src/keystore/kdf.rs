//! Password-based key derivation
//!
//! Two interchangeable functions are supported: scrypt and PBKDF2 with
//! HMAC-SHA256. The `kdf` name of a `Crypto` record selects which parameter
//! set `kdfparams` is read as.

use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::error::{KeystoreError, KeystoreResult};
use crate::encoding::strip_hex_prefix;
use crate::secure::{IntoSecret, SecretBytes};

/// Default scrypt CPU/memory cost
pub const SCRYPT_N: u32 = 4096;
/// Default scrypt block size
pub const SCRYPT_R: u32 = 8;
/// Default scrypt parallelization
pub const SCRYPT_P: u32 = 1;

/// Default PBKDF2 iteration count
pub const PBKDF2_C: u32 = 262144;
/// The only PBKDF2 pseudo-random function accepted
pub const PBKDF2_PRF: &str = "hmac-sha256";

/// Derived key length in bytes
pub const DKLEN: u32 = 32;
/// Longest derived key accepted from a document
pub const MAX_DKLEN: u32 = 64;

/// Upper bound on scrypt working memory (`128 * n * r` bytes)
pub const MAX_SCRYPT_MEMORY: u64 = 1 << 30;
/// Upper bound on scrypt parallelization
pub const MAX_SCRYPT_P: u32 = 16;
/// Upper bound on PBKDF2 iterations
pub const MAX_PBKDF2_C: u32 = 10_000_000;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 32;

/// KDF identifier written to the `kdf` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KdfKind {
    #[default]
    Scrypt,
    Pbkdf2,
}

impl KdfKind {
    pub fn name(self) -> &'static str {
        match self {
            KdfKind::Scrypt => "scrypt",
            KdfKind::Pbkdf2 => "pbkdf2",
        }
    }
}

impl std::str::FromStr for KdfKind {
    type Err = KeystoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scrypt" => Ok(KdfKind::Scrypt),
            "pbkdf2" => Ok(KdfKind::Pbkdf2),
            other => Err(KeystoreError::UnsupportedKdf(other.to_string())),
        }
    }
}

impl std::fmt::Display for KdfKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// scrypt parameters as stored in `kdfparams`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScryptParams {
    pub dklen: u32,
    pub n: u32,
    pub p: u32,
    pub r: u32,
    /// Salt as hex string
    pub salt: String,
}

/// PBKDF2 parameters as stored in `kdfparams`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pbkdf2Params {
    pub dklen: u32,
    pub c: u32,
    pub prf: String,
    /// Salt as hex string
    pub salt: String,
}

/// KDF parameters. Serialized bare; the `kdf` name next to them says which.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum KdfParams {
    Scrypt(ScryptParams),
    Pbkdf2(Pbkdf2Params),
}

impl KdfParams {
    /// Default scrypt parameters around `salt`.
    pub fn scrypt(salt: &[u8]) -> Self {
        KdfParams::Scrypt(ScryptParams {
            dklen: DKLEN,
            n: SCRYPT_N,
            p: SCRYPT_P,
            r: SCRYPT_R,
            salt: hex::encode(salt),
        })
    }

    /// Default PBKDF2 parameters around `salt`.
    pub fn pbkdf2(salt: &[u8]) -> Self {
        KdfParams::Pbkdf2(Pbkdf2Params {
            dklen: DKLEN,
            c: PBKDF2_C,
            prf: PBKDF2_PRF.to_string(),
            salt: hex::encode(salt),
        })
    }

    /// Read `kdfparams` as the parameter set of `kind`.
    pub fn from_value(kind: KdfKind, value: serde_json::Value) -> KeystoreResult<Self> {
        let params = match kind {
            KdfKind::Scrypt => serde_json::from_value(value).map(KdfParams::Scrypt),
            KdfKind::Pbkdf2 => serde_json::from_value(value).map(KdfParams::Pbkdf2),
        };
        params.map_err(|e| KeystoreError::InvalidKdfParams(format!("{} kdfparams: {}", kind, e)))
    }

    pub fn kind(&self) -> KdfKind {
        match self {
            KdfParams::Scrypt(_) => KdfKind::Scrypt,
            KdfParams::Pbkdf2(_) => KdfKind::Pbkdf2,
        }
    }

    fn salt_hex(&self) -> &str {
        match self {
            KdfParams::Scrypt(params) => strip_hex_prefix(&params.salt),
            KdfParams::Pbkdf2(params) => strip_hex_prefix(&params.salt),
        }
    }

    fn dklen(&self) -> u32 {
        match self {
            KdfParams::Scrypt(params) => params.dklen,
            KdfParams::Pbkdf2(params) => params.dklen,
        }
    }

    /// Validate the parameters, bounding the work a document can demand.
    pub fn validate(&self) -> KeystoreResult<()> {
        if !(DKLEN..=MAX_DKLEN).contains(&self.dklen()) {
            return Err(KeystoreError::InvalidKdfParams(format!(
                "dklen must be between {} and {}",
                DKLEN, MAX_DKLEN
            )));
        }

        match self {
            KdfParams::Scrypt(params) => {
                if params.n < 2 || !params.n.is_power_of_two() {
                    return Err(KeystoreError::InvalidKdfParams(
                        "n must be a power of 2 greater than 1".to_string(),
                    ));
                }
                if params.r == 0 || params.p == 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "r and p must be positive".to_string(),
                    ));
                }
                if 128 * u64::from(params.n) * u64::from(params.r) > MAX_SCRYPT_MEMORY {
                    return Err(KeystoreError::InvalidKdfParams(format!(
                        "n={} r={} needs more than {} bytes",
                        params.n, params.r, MAX_SCRYPT_MEMORY
                    )));
                }
                if params.p > MAX_SCRYPT_P {
                    return Err(KeystoreError::InvalidKdfParams(format!(
                        "p must be at most {}",
                        MAX_SCRYPT_P
                    )));
                }
            }
            KdfParams::Pbkdf2(params) => {
                if params.c == 0 || params.c > MAX_PBKDF2_C {
                    return Err(KeystoreError::InvalidKdfParams(format!(
                        "c must be between 1 and {}",
                        MAX_PBKDF2_C
                    )));
                }
            }
        }
        hex::decode(self.salt_hex())
            .map_err(|e| KeystoreError::InvalidKdfParams(format!("invalid salt hex: {}", e)))?;
        Ok(())
    }

    /// Derive key material from `password` with these parameters.
    pub fn derive_key(&self, password: &str) -> KeystoreResult<SecretBytes> {
        self.validate()?;
        let salt = hex::decode(self.salt_hex())
            .map_err(|e| KeystoreError::HexError(format!("invalid salt hex: {}", e)))?;

        match self {
            KdfParams::Scrypt(params) => scrypt_derive_key(
                password,
                &salt,
                params.n,
                params.r,
                params.p,
                params.dklen as usize,
            ),
            KdfParams::Pbkdf2(params) => pbkdf2_derive_key(
                password,
                &salt,
                params.c,
                &params.prf,
                params.dklen as usize,
            ),
        }
    }
}

/// Derive a key using scrypt.
///
/// `n` must be a power of 2.
pub fn scrypt_derive_key(
    password: &str,
    salt: &[u8],
    n: u32,
    r: u32,
    p: u32,
    dklen: usize,
) -> KeystoreResult<SecretBytes> {
    let log_n = n.trailing_zeros() as u8;

    let params = scrypt::Params::new(log_n, r, p, dklen)
        .map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))?;

    let mut output = vec![0u8; dklen];
    scrypt::scrypt(password.as_bytes(), salt, &params, &mut output)
        .map_err(|e| KeystoreError::KdfError(e.to_string()))?;

    Ok(output.into_secret())
}

/// Derive a key using PBKDF2.
///
/// Fails with [`KeystoreError::UnsupportedPrf`] unless `prf` is `hmac-sha256`.
pub fn pbkdf2_derive_key(
    password: &str,
    salt: &[u8],
    iterations: u32,
    prf: &str,
    dklen: usize,
) -> KeystoreResult<SecretBytes> {
    if prf != PBKDF2_PRF {
        return Err(KeystoreError::UnsupportedPrf(prf.to_string()));
    }

    let mut output = vec![0u8; dklen];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut output);

    Ok(output.into_secret())
}

/// Generate a random salt
pub fn generate_salt() -> Vec<u8> {
    use rand::RngCore;
    let mut salt = vec![0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_scrypt_derive_key() {
        let salt = vec![0xAA; 32];

        let derived = scrypt_derive_key("password", &salt, 1024, 8, 1, 32).unwrap();
        assert_eq!(derived.expose_secret().len(), 32);

        let again = scrypt_derive_key("password", &salt, 1024, 8, 1, 32).unwrap();
        assert_eq!(derived.expose_secret(), again.expose_secret());

        let other = scrypt_derive_key("different", &salt, 1024, 8, 1, 32).unwrap();
        assert_ne!(derived.expose_secret(), other.expose_secret());
    }

    #[test]
    fn test_pbkdf2_rfc7914_vector() {
        // RFC 7914 section 11: PBKDF2-HMAC-SHA256("passwd", "salt", 1, 64)
        let derived = pbkdf2_derive_key("passwd", b"salt", 1, PBKDF2_PRF, 64).unwrap();
        assert_eq!(
            hex::encode(derived.expose_secret()),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc\
             49ca9cccf179b645991664b39d77ef317c71b845b1e30bd509112041d3a19783"
        );
    }

    #[test]
    fn test_pbkdf2_rejects_other_prf() {
        let result = pbkdf2_derive_key("password", b"salt", 1, "hmac-sha512", 32);
        assert!(matches!(result, Err(KeystoreError::UnsupportedPrf(prf)) if prf == "hmac-sha512"));
    }

    #[test]
    fn test_params_validation() {
        let salt = [0xAA; 32];
        assert!(KdfParams::scrypt(&salt).validate().is_ok());
        assert!(KdfParams::pbkdf2(&salt).validate().is_ok());

        let mut bad = KdfParams::scrypt(&salt);
        if let KdfParams::Scrypt(params) = &mut bad {
            params.n = 12345;
        }
        assert!(matches!(bad.validate(), Err(KeystoreError::InvalidKdfParams(_))));

        let mut bad = KdfParams::pbkdf2(&salt);
        if let KdfParams::Pbkdf2(params) = &mut bad {
            params.dklen = 16;
        }
        assert!(matches!(bad.validate(), Err(KeystoreError::InvalidKdfParams(_))));

        let mut bad = KdfParams::pbkdf2(&salt);
        if let KdfParams::Pbkdf2(params) = &mut bad {
            params.salt = "not hex".to_string();
        }
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_params_read_by_kdf_name() {
        let scrypt_json = serde_json::json!({"dklen":32,"n":4096,"p":1,"r":8,"salt":"aa"});
        let pbkdf2_json =
            serde_json::json!({"dklen":32,"c":262144,"prf":"hmac-sha256","salt":"aa"});

        let scrypt = KdfParams::from_value(KdfKind::Scrypt, scrypt_json.clone()).unwrap();
        assert_eq!(scrypt.kind(), KdfKind::Scrypt);
        let pbkdf2 = KdfParams::from_value(KdfKind::Pbkdf2, pbkdf2_json.clone()).unwrap();
        assert_eq!(pbkdf2.kind(), KdfKind::Pbkdf2);

        // The name decides; a mismatched field set does not fall through
        assert!(matches!(
            KdfParams::from_value(KdfKind::Pbkdf2, scrypt_json),
            Err(KeystoreError::InvalidKdfParams(_))
        ));
        assert!(matches!(
            KdfParams::from_value(KdfKind::Scrypt, pbkdf2_json),
            Err(KeystoreError::InvalidKdfParams(_))
        ));
    }

    #[test]
    fn test_work_bounds() {
        let salt = [0xAA; 32];
        let params = |n, r, p| {
            KdfParams::Scrypt(ScryptParams {
                dklen: DKLEN,
                n,
                r,
                p,
                salt: hex::encode(salt),
            })
        };

        assert!(params(1 << 18, 8, 1).validate().is_ok());
        assert!(matches!(
            params(1 << 30, 8, 1).validate(),
            Err(KeystoreError::InvalidKdfParams(_))
        ));
        assert!(matches!(
            params(1 << 18, 1024, 1).validate(),
            Err(KeystoreError::InvalidKdfParams(_))
        ));
        assert!(matches!(
            params(4096, 8, 1000).validate(),
            Err(KeystoreError::InvalidKdfParams(_))
        ));

        let mut bad = KdfParams::pbkdf2(&salt);
        if let KdfParams::Pbkdf2(params) = &mut bad {
            params.c = u32::MAX;
        }
        assert!(matches!(bad.validate(), Err(KeystoreError::InvalidKdfParams(_))));

        let mut bad = KdfParams::pbkdf2(&salt);
        if let KdfParams::Pbkdf2(params) = &mut bad {
            params.dklen = u32::MAX;
        }
        assert!(matches!(bad.validate(), Err(KeystoreError::InvalidKdfParams(_))));
    }

    #[test]
    fn test_prefixed_salt_derives_same_key() {
        let salt = [0xAA; 32];
        let plain = KdfParams::pbkdf2(&salt);
        let mut prefixed = plain.clone();
        if let KdfParams::Pbkdf2(params) = &mut prefixed {
            params.c = 1000;
            params.salt = format!("0x{}", params.salt);
        }
        let mut plain = plain;
        if let KdfParams::Pbkdf2(params) = &mut plain {
            params.c = 1000;
        }

        assert_eq!(
            prefixed.derive_key("password").unwrap().expose_secret(),
            plain.derive_key("password").unwrap().expose_secret()
        );
    }

    #[test]
    fn test_defaults_serialize_with_expected_fields() {
        let json = serde_json::to_value(KdfParams::pbkdf2(&[0x01; 32])).unwrap();
        assert_eq!(json["c"], 262144);
        assert_eq!(json["prf"], "hmac-sha256");
        assert_eq!(json["dklen"], 32);

        let json = serde_json::to_value(KdfParams::scrypt(&[0x01; 32])).unwrap();
        assert_eq!(json["n"], 4096);
        assert_eq!(json["r"], 8);
        assert_eq!(json["p"], 1);
    }

    #[test]
    fn test_generate_salt() {
        let salt1 = generate_salt();
        let salt2 = generate_salt();

        assert_eq!(salt1.len(), SALT_LENGTH);
        assert_ne!(salt1, salt2);
    }

    #[test]
    fn test_kdf_kind_from_str() {
        assert_eq!("PBKDF2".parse::<KdfKind>().unwrap(), KdfKind::Pbkdf2);
        assert!(matches!(
            "argon2".parse::<KdfKind>(),
            Err(KeystoreError::UnsupportedKdf(_))
        ));
    }
}
