//! Keccak-256 MAC binding a derived key to its ciphertext
//!
//! The MAC is computed over: derived_key[16:32] || ciphertext

use alloy_primitives::keccak256;

use super::error::{KeystoreError, KeystoreResult};

// Byte range of the derived key that feeds the MAC
const MAC_KEY_START: usize = 16;
const MAC_KEY_END: usize = 32;

/// Compute `keccak256(derived_key[16..32] || ciphertext)`.
pub fn compute_mac(derived_key: &[u8], ciphertext: &[u8]) -> KeystoreResult<[u8; 32]> {
    if derived_key.len() < MAC_KEY_END {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "derived key must be at least {} bytes, got {}",
            MAC_KEY_END,
            derived_key.len()
        )));
    }

    let mut preimage = Vec::with_capacity(MAC_KEY_END - MAC_KEY_START + ciphertext.len());
    preimage.extend_from_slice(&derived_key[MAC_KEY_START..MAC_KEY_END]);
    preimage.extend_from_slice(ciphertext);

    Ok(keccak256(&preimage).0)
}

/// Check a stored MAC in constant time.
///
/// Returns `Err(InvalidPassword)` on mismatch.
pub fn verify_mac(derived_key: &[u8], ciphertext: &[u8], expected: &[u8]) -> KeystoreResult<()> {
    let computed = compute_mac(derived_key, ciphertext)?;

    if constant_time_eq(&computed, expected) {
        Ok(())
    } else {
        Err(KeystoreError::InvalidPassword)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_is_keccak_of_second_half() {
        let mut key = vec![0x11; 16];
        key.extend_from_slice(&[0x22; 16]);
        let ciphertext = [0x33; 32];

        let mut preimage = vec![0x22; 16];
        preimage.extend_from_slice(&ciphertext);

        assert_eq!(compute_mac(&key, &ciphertext).unwrap(), keccak256(&preimage).0);
    }

    #[test]
    fn test_first_half_does_not_affect_mac() {
        let ciphertext = [0x33; 32];
        let mut key_a = vec![0xAA; 32];
        let mut key_b = vec![0xBB; 32];
        key_a[16..].copy_from_slice(&[0xCC; 16]);
        key_b[16..].copy_from_slice(&[0xCC; 16]);

        assert_eq!(
            compute_mac(&key_a, &ciphertext).unwrap(),
            compute_mac(&key_b, &ciphertext).unwrap()
        );
    }

    #[test]
    fn test_verify_mac() {
        let key = [0x44; 32];
        let ciphertext = [0x55; 32];
        let mac = compute_mac(&key, &ciphertext).unwrap();

        assert!(verify_mac(&key, &ciphertext, &mac).is_ok());

        let mut tampered = ciphertext;
        tampered[0] ^= 0x01;
        assert!(matches!(
            verify_mac(&key, &tampered, &mac),
            Err(KeystoreError::InvalidPassword)
        ));
        assert!(matches!(
            verify_mac(&key, &ciphertext, &mac[..16]),
            Err(KeystoreError::InvalidPassword)
        ));
    }

    #[test]
    fn test_short_key_rejected() {
        assert!(compute_mac(&[0x01; 16], &[0x02; 32]).is_err());
    }
}
