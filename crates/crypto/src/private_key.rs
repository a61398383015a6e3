//! secp256k1 private keys and the signatures they produce
//!
//! Addresses follow the Ethereum derivation:
//! `keccak256(uncompressed_pubkey[1..])[12..]`.

use alloy_primitives::{keccak256, Address, B256};
use k256::{
    ecdsa::{RecoveryId, SigningKey},
    elliptic_curve::sec1::ToEncodedPoint,
};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::encoding::strip_hex_prefix;
use crate::error::{CryptoError, CryptoResult};
use crate::signature::{SignatureData, LEGACY_V_OFFSET};

/// Private key length in bytes
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// A secp256k1 scalar in `(0, n)`.
///
/// The scalar is zeroized on drop and never printed by `Debug`.
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Parse a 64-char hex scalar, with or without `0x`.
    pub fn from_hex(value: &str) -> CryptoResult<Self> {
        let body = strip_hex_prefix(value);
        if body.len() != PRIVATE_KEY_LENGTH * 2 {
            return Err(CryptoError::InvalidKey(format!(
                "expected {} hex characters, got {}",
                PRIVATE_KEY_LENGTH * 2,
                body.len()
            )));
        }
        let bytes = Zeroizing::new(
            hex::decode(body).map_err(|e| CryptoError::InvalidKey(e.to_string()))?,
        );
        let mut arr = Zeroizing::new([0u8; PRIVATE_KEY_LENGTH]);
        arr.copy_from_slice(&bytes);
        Self::from_bytes(&arr)
    }

    /// Load from a 32-byte big-endian scalar.
    pub fn from_bytes(bytes: &[u8; PRIVATE_KEY_LENGTH]) -> CryptoResult<Self> {
        SigningKey::from_slice(bytes)
            .map(|signing_key| Self { signing_key })
            .map_err(|_| CryptoError::InvalidKey("scalar is outside (0, n)".to_string()))
    }

    /// Generate a new key from the thread CSPRNG, optionally salted.
    ///
    /// The candidate is `keccak256(pad_a || keccak256(random || entropy) || pad_b)`
    /// with fresh random padding. When `entropy` is absent 32 more random bytes
    /// stand in for it. A candidate outside the curve order is reported as
    /// [`CryptoError::InvalidKey`]; callers regenerate.
    pub fn generate(entropy: Option<&[u8]>) -> CryptoResult<Self> {
        let mut rng = rand::thread_rng();
        let mut draw = || {
            let mut bytes = Zeroizing::new([0u8; 32]);
            rng.fill_bytes(&mut bytes[..]);
            bytes
        };

        let random = draw();
        let entropy = match entropy {
            Some(entropy) => Zeroizing::new(entropy.to_vec()),
            None => Zeroizing::new(draw().to_vec()),
        };

        let mut inner_input = Zeroizing::new(Vec::with_capacity(32 + entropy.len()));
        inner_input.extend_from_slice(&random[..]);
        inner_input.extend_from_slice(&entropy);
        let inner = keccak256(inner_input.as_slice());

        let (pad_a, pad_b) = (draw(), draw());
        let mut outer_input = Zeroizing::new(Vec::with_capacity(96));
        outer_input.extend_from_slice(&pad_a[..]);
        outer_input.extend_from_slice(inner.as_slice());
        outer_input.extend_from_slice(&pad_b[..]);
        let candidate = Zeroizing::new(keccak256(outer_input.as_slice()).0);

        Self::from_bytes(&candidate)
    }

    /// Big-endian scalar bytes.
    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_LENGTH]> {
        Zeroizing::new(self.signing_key.to_bytes().into())
    }

    /// `0x` + 64 lowercase hex chars.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.to_bytes()[..]))
    }

    /// Hex public key without `0x`.
    ///
    /// Compressed keys are `02`/`03` + X (66 chars); uncompressed keys are
    /// X || Y without the SEC1 tag (128 chars).
    pub fn public_key(&self, compressed: bool) -> String {
        let point = self.signing_key.verifying_key().to_encoded_point(compressed);
        if compressed {
            hex::encode(point.as_bytes())
        } else {
            hex::encode(&point.as_bytes()[1..])
        }
    }

    /// Address derived from the public key.
    pub fn derived_address(&self) -> Address {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        Address::from_slice(&hash[12..])
    }

    /// Sign a 32-byte hash and encode `chain_id` into `v`.
    pub fn sign(&self, hash: &B256, chain_id: u64) -> CryptoResult<SignatureData> {
        self.sign_message(hash)?.with_chain_id(chain_id)
    }

    /// Sign a 32-byte hash, leaving `v = 27 + recovery_id`.
    pub fn sign_message(&self, hash: &B256) -> CryptoResult<SignatureData> {
        let (signature, recovery_id) = self.sign_prehash(hash)?;
        Ok(SignatureData::from_k256(
            &signature,
            LEGACY_V_OFFSET + recovery_id.to_byte() as u64,
        ))
    }

    /// Sign a 32-byte hash, leaving `v` as the bare y parity (`0`/`1`).
    pub fn ecsign(&self, hash: &B256) -> CryptoResult<SignatureData> {
        let (signature, recovery_id) = self.sign_prehash(hash)?;
        Ok(SignatureData::from_k256(
            &signature,
            recovery_id.to_byte() as u64,
        ))
    }

    fn sign_prehash(&self, hash: &B256) -> CryptoResult<(k256::ecdsa::Signature, RecoveryId)> {
        self.signing_key
            .sign_prehash_recoverable(hash.as_slice())
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        *self.to_bytes() == *other.to_bytes()
    }
}

impl Eq for PrivateKey {}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
