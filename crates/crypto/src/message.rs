//! Prefixed message hashing and signer recovery

use alloy_primitives::{keccak256, Address, B256};
use k256::{ecdsa::VerifyingKey, elliptic_curve::sec1::ToEncodedPoint};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::signature::SignatureData;

/// Prefix prepended to every message before hashing
pub const MESSAGE_PREFIX: &str = "\x19Klaytn Signed Message:\n";

/// `keccak256(prefix || len(message) || message)`, with the length in decimal.
pub fn hash_message(message: &[u8]) -> B256 {
    let mut preimage = Vec::with_capacity(MESSAGE_PREFIX.len() + 20 + message.len());
    preimage.extend_from_slice(MESSAGE_PREFIX.as_bytes());
    preimage.extend_from_slice(message.len().to_string().as_bytes());
    preimage.extend_from_slice(message);
    keccak256(&preimage)
}

/// Recover the signer address of `hash` from a signature.
///
/// Works for any `v` encoding [`SignatureData::recovery_id`] understands.
pub fn recover(hash: &B256, signature: &SignatureData) -> CryptoResult<Address> {
    let (sig, recovery_id) = signature.to_k256()?;
    let key = VerifyingKey::recover_from_prehash(hash.as_slice(), &sig, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;

    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    Ok(Address::from_slice(&digest[12..]))
}

/// Output of signing a prefixed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSigned {
    /// Hash that was actually signed
    pub message_hash: B256,
    pub signatures: Vec<SignatureData>,
    /// Original message as passed by the caller
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::private_key::PrivateKey;

    #[test]
    fn test_hash_message_uses_prefix() {
        let message = b"Some data";
        let mut expected = Vec::new();
        expected.extend_from_slice(b"\x19Klaytn Signed Message:\n9Some data");
        assert_eq!(hash_message(message), keccak256(&expected));
        assert_ne!(hash_message(message), keccak256(message));
    }

    #[test]
    fn test_recover_rejects_placeholder() {
        let hash = hash_message(b"data");
        assert!(recover(&hash, &SignatureData::empty()).is_err());
    }

    #[test]
    fn test_recover_wrong_hash_gives_other_address() {
        let key = PrivateKey::generate(None).unwrap();
        let hash = hash_message(b"signed");
        let sig = key.sign_message(&hash).unwrap();

        let other = hash_message(b"not signed");
        // Recovery over a different digest yields some unrelated key, or fails.
        if let Ok(address) = recover(&other, &sig) {
            assert_ne!(address, key.derived_address());
        }
    }
}
