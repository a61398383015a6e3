//! Key export command implementation
//!
//! Exports public key information (never exports private keys).

use super::common::{get_passphrase, open_existing_store, resolve_keys_dir};
use anyhow::{Context, Result};
use klaykeys_crypto::encoding::parse_address;
use klaykeys_crypto::{Account, Keyring, KeyringKind, PublicKeys};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Public view of a decrypted keyring
#[derive(Debug, Serialize)]
pub struct PublicExport {
    pub address: String,
    pub kind: KeyringKind,
    pub decoupled: bool,
    pub public_keys: PublicKeys,
    pub account: Account,
}

impl PublicExport {
    pub fn from_keyring(keyring: &Keyring, compressed: bool) -> Result<Self> {
        Ok(Self {
            address: keyring.address_hex(),
            kind: keyring.kind(),
            decoupled: keyring.is_decoupled(),
            public_keys: keyring.public_keys(compressed),
            account: keyring
                .to_account()
                .context("Failed to build account key")?,
        })
    }
}

/// Execute the export command
pub fn execute(
    home: &Path,
    address: &str,
    compressed: bool,
    format: &str,
    keys_dir: Option<PathBuf>,
    passphrase_file: Option<PathBuf>,
) -> Result<()> {
    let keys_dir = resolve_keys_dir(home, keys_dir);
    let store = open_existing_store(&keys_dir)?;
    let address = parse_address(address)?;
    let keystore = store.load(&address)?;

    let passphrase = get_passphrase(
        passphrase_file.as_deref(),
        "Enter passphrase to unlock keystore: ",
        false,
    )?;
    let keyring = Keyring::decrypt(&keystore, &passphrase).context("Failed to decrypt keystore")?;
    let export = PublicExport::from_keyring(&keyring, compressed)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&export)?),
        _ => print_text(&export),
    }

    Ok(())
}

fn print_text(export: &PublicExport) {
    println!("Address:   {}", export.address);
    println!("Kind:      {}", export.kind);
    println!("Decoupled: {}", export.decoupled);
    println!();
    println!("Public Keys:");
    match &export.public_keys {
        PublicKeys::Single(key) => println!("  {}", key),
        PublicKeys::Multiple(keys) => {
            for (i, key) in keys.iter().enumerate() {
                println!("  [{}] {}", i, key);
            }
        }
        PublicKeys::RoleBased(groups) => {
            for (role, keys) in klaykeys_crypto::RoleGroup::ALL.iter().zip(groups) {
                println!("  {}:", role);
                if keys.is_empty() {
                    println!("    (none)");
                }
                for (i, key) in keys.iter().enumerate() {
                    println!("    [{}] {}", i, key);
                }
            }
        }
    }
}
