//! Key import command implementation
//!
//! Imports a raw private key, a wallet key, or a list of raw keys.

use super::common::{
    encrypt_keyring, get_passphrase, keystore_options, open_store, resolve_keys_dir,
    validate_passphrase,
};
use anyhow::{anyhow, bail, Context, Result};
use klaykeys_crypto::Keyring;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use zeroize::Zeroizing;

/// Execute the import command
#[allow(clippy::too_many_arguments)]
pub fn execute(
    home: &Path,
    key_file: Option<PathBuf>,
    address: Option<&str>,
    kdf: &str,
    v3: bool,
    keys_dir: Option<PathBuf>,
    passphrase_file: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let keys_dir = resolve_keys_dir(home, keys_dir);
    let options = keystore_options(kdf)?;

    let keys = read_keys(key_file.as_deref())?;
    let keyring = keyring_from_keys(&keys, address)?;
    if v3 && keyring.key_count() != 1 {
        bail!("Version 3 keystores hold a single key; drop --v3 to import several keys");
    }

    let store = open_store(&keys_dir)?;
    if store.exists(&keyring.address()) {
        if !force {
            return Err(anyhow!(
                "A keystore for {} already exists. Use --force to overwrite.",
                keyring.address_hex()
            ));
        }
        println!("Overwriting existing keystore for {}", keyring.address_hex());
    }

    let passphrase = get_passphrase(
        passphrase_file.as_deref(),
        "Enter passphrase for keystore encryption: ",
        passphrase_file.is_none(),
    )?;
    validate_passphrase(&passphrase)?;

    let keystore = encrypt_keyring(&keyring, &passphrase, &options, v3)?;
    let path = store.save(&keystore).context("Failed to save keystore")?;
    info!(address = %keyring.address_hex(), kind = %keyring.kind(), "Imported keyring");

    println!();
    println!("Keys imported successfully!");
    println!();
    println!("File created:");
    println!("  {}", path.display());
    println!();
    println!("Keyring Information:");
    println!("  Address:   {}", keyring.address_hex());
    println!("  Kind:      {}", keyring.kind());
    println!("  Keys:      {}", keyring.key_count());
    println!("  Decoupled: {}", keyring.is_decoupled());
    println!();

    Ok(())
}

/// Read non-empty key lines from a file, or one key from the terminal
fn read_keys(key_file: Option<&Path>) -> Result<Vec<Zeroizing<String>>> {
    let content = match key_file {
        Some(path) => Zeroizing::new(
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read key file: {}", path.display()))?,
        ),
        None => Zeroizing::new(
            rpassword::prompt_password("Enter private key or wallet key: ")
                .context("Failed to read private key")?,
        ),
    };

    let keys: Vec<Zeroizing<String>> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Zeroizing::new(line.to_string()))
        .collect();

    if keys.is_empty() {
        return Err(anyhow!("No private key given"));
    }
    Ok(keys)
}

fn keyring_from_keys(keys: &[Zeroizing<String>], address: Option<&str>) -> Result<Keyring> {
    match (keys, address) {
        ([key], None) => Ok(Keyring::from_private_key(key)?),
        ([key], Some(address)) => Ok(Keyring::create_with_single_key(address, key)?),
        (_, Some(address)) => {
            let keys: Vec<&str> = keys.iter().map(|key| key.as_str()).collect();
            Ok(Keyring::create_with_multiple_keys(address, &keys)?)
        }
        (_, None) => bail!("--address is required when importing several keys"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klaykeys_crypto::KeyringKind;
    use tempfile::tempdir;

    const KEY: &str = "0x45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8";
    const ADDRESS: &str = "0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b";

    fn keys(values: &[&str]) -> Vec<Zeroizing<String>> {
        values.iter().map(|v| Zeroizing::new(v.to_string())).collect()
    }

    #[test]
    fn test_keyring_from_single_key() {
        let keyring = keyring_from_keys(&keys(&[KEY]), None).unwrap();
        assert_eq!(keyring.address_hex(), ADDRESS);

        let other = "0x00000000000000000000000000000000000000bb";
        let decoupled = keyring_from_keys(&keys(&[KEY]), Some(other)).unwrap();
        assert!(decoupled.is_decoupled());
    }

    #[test]
    fn test_keyring_from_wallet_key() {
        let other = "0x00000000000000000000000000000000000000cc";
        let wallet_key = format!("{}0x00{}", KEY, other);
        let keyring = keyring_from_keys(&keys(&[&wallet_key]), None).unwrap();
        assert_eq!(keyring.address_hex(), other);
    }

    #[test]
    fn test_keyring_from_several_keys() {
        assert!(keyring_from_keys(&keys(&[KEY, KEY]), None).is_err());

        let keyring = keyring_from_keys(&keys(&[KEY, KEY]), Some(ADDRESS)).unwrap();
        assert_eq!(keyring.kind(), KeyringKind::Multiple);
        assert_eq!(keyring.key_count(), 2);
    }

    #[test]
    fn test_read_keys_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys.txt");
        fs::write(&path, format!("\n{}\n\n  {}  \n", KEY, KEY)).unwrap();

        let read = read_keys(Some(&path)).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[1].as_str(), KEY);

        fs::write(&path, "\n\n").unwrap();
        assert!(read_keys(Some(&path)).is_err());
    }
}
