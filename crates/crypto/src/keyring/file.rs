//! Directory of keystore documents, one `<address>.json` per account
//!
//! Files are written with 0600 permissions inside a 0700 directory. The
//! store never decrypts; listing reads only the public envelope fields.

use std::fs;
use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::{KeyringError, KeyringResult};
use super::KeyringKind;
use crate::encoding::address_to_hex;
use crate::keystore::{KeyStore, KeyringCrypto};

/// Public view of one stored keystore
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyStoreSummary {
    pub address: String,
    pub version: u32,
    pub id: String,
    pub key_count: usize,
    pub shape: KeyringKind,
}

impl KeyStoreSummary {
    fn from_keystore(keystore: &KeyStore) -> Self {
        let (key_count, shape) = match &keystore.keyring {
            None => (1, KeyringKind::Single),
            Some(KeyringCrypto::Flat(records)) if records.len() == 1 => (1, KeyringKind::Single),
            Some(KeyringCrypto::Flat(records)) => (records.len(), KeyringKind::Multiple),
            Some(keyring @ KeyringCrypto::RoleBased(_)) => {
                (keyring.key_count(), KeyringKind::RoleBased)
            }
        };
        Self {
            address: keystore.address.to_lowercase(),
            version: keystore.version,
            id: keystore.id.clone(),
            key_count,
            shape,
        }
    }
}

/// Keystore documents stored under one directory
pub struct FileKeyStore {
    base_path: PathBuf,
}

impl FileKeyStore {
    /// Open `base_path`, creating it owner-only if missing.
    pub fn new(base_path: &Path) -> KeyringResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(base_path)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = fs::Permissions::from_mode(0o700);
                fs::set_permissions(base_path, perms)?;
            }
        }

        Ok(Self {
            base_path: base_path.to_path_buf(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File path for an address
    pub fn keystore_path(&self, address: &Address) -> PathBuf {
        self.base_path.join(format!("{}.json", address_to_hex(address)))
    }

    /// Write `keystore` under its own address, replacing any previous file.
    pub fn save(&self, keystore: &KeyStore) -> KeyringResult<PathBuf> {
        let address = keystore.parsed_address()?;
        keystore.validate()?;
        let path = self.keystore_path(&address);
        keystore.save(&path)?;
        debug!(path = %path.display(), version = keystore.version, "Saved keystore");
        Ok(path)
    }

    pub fn load(&self, address: &Address) -> KeyringResult<KeyStore> {
        let path = self.keystore_path(address);
        if !path.exists() {
            return Err(KeyringError::KeyringNotFound(address_to_hex(address)));
        }
        Ok(KeyStore::load(&path)?)
    }

    pub fn exists(&self, address: &Address) -> bool {
        self.keystore_path(address).exists()
    }

    pub fn delete(&self, address: &Address) -> KeyringResult<()> {
        let path = self.keystore_path(address);
        if !path.exists() {
            return Err(KeyringError::KeyringNotFound(address_to_hex(address)));
        }

        fs::remove_file(&path)?;
        debug!(path = %path.display(), "Deleted keystore");
        Ok(())
    }

    /// Summaries of every readable keystore, sorted by address.
    ///
    /// Files that do not parse as keystores are skipped.
    pub fn list(&self) -> KeyringResult<Vec<KeyStoreSummary>> {
        let mut summaries = Vec::new();

        if !self.base_path.exists() {
            return Ok(summaries);
        }

        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if !path.is_file() || !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }

            match KeyStore::load(&path) {
                Ok(keystore) if keystore.validate().is_ok() => {
                    summaries.push(KeyStoreSummary::from_keystore(&keystore))
                }
                Ok(_) => warn!(path = %path.display(), "Skipping malformed keystore"),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable keystore"),
            }
        }

        summaries.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyring::Keyring;
    use crate::keystore::KeyStoreOptions;
    use crate::private_key::PrivateKey;
    use tempfile::TempDir;

    fn fast() -> KeyStoreOptions {
        KeyStoreOptions::scrypt().scrypt_cost(1024, 8, 1)
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path()).unwrap();

        let keyring = Keyring::generate(None).unwrap();
        let keystore = keyring.encrypt("test-passphrase", &fast()).unwrap();

        let path = store.save(&keystore).unwrap();
        assert!(path.ends_with(format!("{}.json", keyring.address_hex())));
        assert!(store.exists(&keyring.address()));

        let loaded = store.load(&keyring.address()).unwrap();
        let restored = Keyring::decrypt(&loaded, "test-passphrase").unwrap();
        assert_eq!(restored, keyring);

        store.delete(&keyring.address()).unwrap();
        assert!(!store.exists(&keyring.address()));
    }

    #[test]
    fn test_list_summaries() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path()).unwrap();

        let single = Keyring::generate(None).unwrap();
        let groups = vec![
            vec![PrivateKey::generate(None).unwrap()],
            vec![],
            vec![PrivateKey::generate(None).unwrap(), PrivateKey::generate(None).unwrap()],
        ];
        let roles = Keyring::role_based(Address::repeat_byte(0x01), groups).unwrap();

        store.save(&single.encrypt_v3("password", &fast()).unwrap()).unwrap();
        store.save(&roles.encrypt("password", &fast()).unwrap()).unwrap();
        fs::write(temp_dir.path().join("notes.json"), "{}").unwrap();
        fs::write(temp_dir.path().join("readme.txt"), "hello").unwrap();

        let summaries = store.list().unwrap();
        assert_eq!(summaries.len(), 2);

        let role_summary = summaries
            .iter()
            .find(|s| s.address == roles.address_hex())
            .unwrap();
        assert_eq!(role_summary.version, 4);
        assert_eq!(role_summary.key_count, 3);
        assert_eq!(role_summary.shape, KeyringKind::RoleBased);

        let single_summary = summaries
            .iter()
            .find(|s| s.address == single.address_hex())
            .unwrap();
        assert_eq!(single_summary.version, 3);
        assert_eq!(single_summary.shape, KeyringKind::Single);
    }

    #[test]
    fn test_load_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path()).unwrap();

        assert!(matches!(
            store.load(&Address::ZERO),
            Err(KeyringError::KeyringNotFound(_))
        ));
        assert!(matches!(
            store.delete(&Address::ZERO),
            Err(KeyringError::KeyringNotFound(_))
        ));
    }

    #[test]
    #[cfg(unix)]
    fn test_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store_path = temp_dir.path().join("keys");
        let store = FileKeyStore::new(&store_path).unwrap();

        let mode = fs::metadata(&store_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o700, "directory should have 0700 permissions");

        let keyring = Keyring::generate(None).unwrap();
        let path = store.save(&keyring.encrypt("password", &fast()).unwrap()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "keystore should have 0600 permissions");
    }
}
