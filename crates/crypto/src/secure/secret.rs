//! Secret wrapper aliases around the `secrecy` crate
//!
//! Derived keys and decrypted payloads travel in these wrappers so they are
//! zeroized on drop and never printed by `Debug`.

use secrecy::SecretBox;

/// A secret byte buffer that is zeroized on drop.
///
/// # Example
///
/// ```rust
/// use klaykeys_crypto::secure::SecretBytes;
/// use secrecy::ExposeSecret;
///
/// let secret = SecretBytes::new(Box::new(vec![1, 2, 3, 4]));
/// assert_eq!(secret.expose_secret(), &vec![1, 2, 3, 4]);
/// ```
pub type SecretBytes = SecretBox<Vec<u8>>;

/// Extension trait for wrapping plain values as secrets.
pub trait IntoSecret {
    type Secret;

    fn into_secret(self) -> Self::Secret;
}

impl IntoSecret for Vec<u8> {
    type Secret = SecretBytes;

    fn into_secret(self) -> Self::Secret {
        SecretBox::new(Box::new(self))
    }
}
