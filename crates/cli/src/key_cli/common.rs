//! Common utilities for key management CLI commands

use anyhow::{anyhow, bail, Context, Result};
use klaykeys_crypto::keystore::{KdfKind, KeyStore, KeyStoreOptions};
use klaykeys_crypto::{FileKeyStore, Keyring};
use std::fs;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Default keys directory name within home
pub const DEFAULT_KEYS_DIR: &str = "keystore";

/// Minimum passphrase length
pub const MIN_PASSPHRASE_LENGTH: usize = 8;

/// Get the default keys directory
pub fn default_keys_dir(home: &Path) -> PathBuf {
    home.join(DEFAULT_KEYS_DIR)
}

/// Resolve keys directory: use provided path or default
pub fn resolve_keys_dir(home: &Path, keys_dir: Option<PathBuf>) -> PathBuf {
    keys_dir.unwrap_or_else(|| default_keys_dir(home))
}

/// Open the keystore directory, creating it owner-only when missing
pub fn open_store(dir: &Path) -> Result<FileKeyStore> {
    FileKeyStore::new(dir)
        .with_context(|| format!("Failed to open keys directory: {}", dir.display()))
}

/// Open an existing keystore directory without creating it
pub fn open_existing_store(dir: &Path) -> Result<FileKeyStore> {
    if !dir.exists() {
        return Err(anyhow!(
            "Keys directory not found: {}\nRun 'klaykeys keys generate' or 'klaykeys keys import' first.",
            dir.display()
        ));
    }
    open_store(dir)
}

/// Read passphrase from file or prompt interactively
pub fn get_passphrase(
    passphrase_file: Option<&Path>,
    prompt: &str,
    confirm: bool,
) -> Result<Zeroizing<String>> {
    if let Some(file) = passphrase_file {
        read_passphrase_from_file(file)
    } else {
        prompt_passphrase(prompt, confirm)
    }
}

/// Read passphrase from a file
pub fn read_passphrase_from_file(path: &Path) -> Result<Zeroizing<String>> {
    let content = Zeroizing::new(
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read passphrase file: {}", path.display()))?,
    );

    let passphrase = Zeroizing::new(content.trim().to_string());

    if passphrase.is_empty() {
        return Err(anyhow!("Passphrase file is empty"));
    }

    Ok(passphrase)
}

/// Prompt for passphrase with optional confirmation
pub fn prompt_passphrase(prompt: &str, confirm: bool) -> Result<Zeroizing<String>> {
    let passphrase = Zeroizing::new(
        rpassword::prompt_password(prompt).context("Failed to read passphrase")?,
    );

    validate_passphrase(&passphrase)?;

    if confirm {
        let confirmation = Zeroizing::new(
            rpassword::prompt_password("Confirm passphrase: ")
                .context("Failed to read passphrase confirmation")?,
        );

        if *passphrase != *confirmation {
            return Err(anyhow!("Passphrases do not match"));
        }
    }

    Ok(passphrase)
}

/// Reject passphrases shorter than [`MIN_PASSPHRASE_LENGTH`]
pub fn validate_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.chars().count() < MIN_PASSPHRASE_LENGTH {
        return Err(anyhow!(
            "Passphrase must be at least {} characters",
            MIN_PASSPHRASE_LENGTH
        ));
    }
    Ok(())
}

/// Keystore options for a KDF name given on the command line
pub fn keystore_options(kdf: &str) -> Result<KeyStoreOptions> {
    let kind: KdfKind = kdf.parse().map_err(|e| anyhow!("{}", e))?;
    Ok(KeyStoreOptions::with_kdf(kind))
}

/// Encrypt a keyring as version 3 or version 4
pub fn encrypt_keyring(
    keyring: &Keyring,
    passphrase: &str,
    options: &KeyStoreOptions,
    v3: bool,
) -> Result<KeyStore> {
    let keystore = if v3 {
        keyring.encrypt_v3(passphrase, options)
    } else {
        keyring.encrypt(passphrase, options)
    };
    keystore.context("Failed to encrypt keyring")
}

/// Parse a comma separated list of per-role key counts, e.g. `2,0,1`
pub fn parse_role_counts(value: &str) -> Result<Vec<usize>> {
    let counts = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid key count: {:?}", part))
        })
        .collect::<Result<Vec<_>>>()?;

    if counts.len() != klaykeys_crypto::ROLE_GROUP_COUNT {
        bail!(
            "Expected {} role counts (transaction,account_update,fee_payer), got {}",
            klaykeys_crypto::ROLE_GROUP_COUNT,
            counts.len()
        );
    }
    Ok(counts)
}
