//! Secure memory handling for key material
//!
//! - Derived keys and decrypted payloads are zeroized on drop
//! - Debug output never shows the wrapped value

mod secret;

pub use secret::{IntoSecret, SecretBytes};
