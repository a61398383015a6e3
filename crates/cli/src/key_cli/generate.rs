//! Key generation command implementation
//!
//! Generates a fresh keyring and writes it as an encrypted keystore.

use super::common::{
    encrypt_keyring, get_passphrase, keystore_options, open_store, parse_role_counts,
    resolve_keys_dir, validate_passphrase,
};
use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use klaykeys_crypto::encoding::parse_address;
use klaykeys_crypto::keyring::factory::{
    generate_multiple_keys, generate_role_based_keys, generate_single_key,
};
use klaykeys_crypto::{Keyring, PrivateKey, MAX_KEYS_PER_ROLE};
use std::path::{Path, PathBuf};
use tracing::info;
use zeroize::Zeroizing;

/// Keyring shape requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Single,
    Multiple(usize),
    RoleBased(Vec<usize>),
}

impl Shape {
    /// Parse the shape flags. Key counts are capped here, before any key exists.
    pub fn from_flags(multiple: Option<usize>, role_based: Option<&str>) -> Result<Self> {
        let shape = match (multiple, role_based) {
            (Some(_), Some(_)) => bail!("--multiple and --role-based are mutually exclusive"),
            (Some(count), None) => Shape::Multiple(count),
            (None, Some(counts)) => Shape::RoleBased(parse_role_counts(counts)?),
            (None, None) => Shape::Single,
        };

        let counts = match &shape {
            Shape::Single => vec![1],
            Shape::Multiple(count) => vec![*count],
            Shape::RoleBased(counts) => counts.clone(),
        };
        if let Some(count) = counts.into_iter().find(|&count| count > MAX_KEYS_PER_ROLE) {
            bail!(
                "At most {} keys per role are allowed, got {}",
                MAX_KEYS_PER_ROLE,
                count
            );
        }
        Ok(shape)
    }
}

/// Execute the generate command
#[allow(clippy::too_many_arguments)]
pub fn execute(
    home: &Path,
    shape: Shape,
    address: Option<&str>,
    kdf: &str,
    v3: bool,
    entropy: Option<&str>,
    keys_dir: Option<PathBuf>,
    passphrase_file: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let keys_dir = resolve_keys_dir(home, keys_dir);
    let options = keystore_options(kdf)?;
    if v3 && shape != Shape::Single {
        bail!("Version 3 keystores hold a single key; drop --v3 for multi-key keyrings");
    }

    let keyring = build_keyring(&shape, address, entropy.map(str::as_bytes))?;
    let address_hex = keyring.address_hex();

    if dry_run {
        println!();
        println!("=== DRY RUN - No files will be written ===");
        println!();
        println!("Would create keystore in: {}", keys_dir.display());
        println!();
        println!("Keyring Information:");
        println!("  Address:   {}", address_hex);
        println!("  Kind:      {}", keyring.kind());
        println!("  Keys:      {}", keyring.key_count());
        println!("  KDF:       {}", options.kdf());
        println!("  Version:   {}", if v3 { 3 } else { 4 });
        return Ok(());
    }

    let passphrase = get_passphrase(
        passphrase_file.as_deref(),
        "Enter passphrase for keystore encryption: ",
        passphrase_file.is_none(),
    )?;
    validate_passphrase(&passphrase)?;

    let store = open_store(&keys_dir)?;
    let keystore = encrypt_keyring(&keyring, &passphrase, &options, v3)?;
    let path = store.save(&keystore).context("Failed to save keystore")?;
    info!(address = %address_hex, kind = %keyring.kind(), "Generated keyring");

    println!();
    println!("Keyring generated successfully!");
    println!();
    println!("File created:");
    println!("  {}", path.display());
    println!();
    println!("Keyring Information:");
    println!("  Address:   {}", address_hex);
    println!("  Kind:      {}", keyring.kind());
    println!("  Keys:      {}", keyring.key_count());
    println!("  Decoupled: {}", keyring.is_decoupled());
    println!();

    Ok(())
}

fn build_keyring(shape: &Shape, address: Option<&str>, entropy: Option<&[u8]>) -> Result<Keyring> {
    match shape {
        Shape::Single => match address {
            Some(address) => {
                let key = Zeroizing::new(generate_single_key(entropy)?);
                Ok(Keyring::create_with_single_key(address, &key)?)
            }
            None => Ok(Keyring::generate(entropy)?),
        },
        Shape::Multiple(count) => {
            let keys = parse_generated(generate_multiple_keys(*count, entropy)?)?;
            let address = resolve_address(address, keys.first())?;
            Ok(Keyring::multiple(address, keys)?)
        }
        Shape::RoleBased(counts) => {
            let groups = generate_role_based_keys(counts, entropy)?
                .into_iter()
                .map(parse_generated)
                .collect::<Result<Vec<_>>>()?;
            let address = resolve_address(address, groups.first().and_then(|g| g.first()))?;
            Ok(Keyring::role_based(address, groups)?)
        }
    }
}

fn parse_generated(keys: Vec<String>) -> Result<Vec<PrivateKey>> {
    keys.into_iter()
        .map(|key| {
            let key = Zeroizing::new(key);
            Ok(PrivateKey::from_hex(&key)?)
        })
        .collect()
}

fn resolve_address(address: Option<&str>, first_key: Option<&PrivateKey>) -> Result<Address> {
    match (address, first_key) {
        (Some(address), _) => Ok(parse_address(address)?),
        (None, Some(key)) => Ok(key.derived_address()),
        (None, None) => bail!("--address is required when no transaction key is generated"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_from_flags() {
        assert_eq!(Shape::from_flags(None, None).unwrap(), Shape::Single);
        assert_eq!(Shape::from_flags(Some(3), None).unwrap(), Shape::Multiple(3));
        assert_eq!(
            Shape::from_flags(None, Some("2,0,1")).unwrap(),
            Shape::RoleBased(vec![2, 0, 1])
        );
        assert!(Shape::from_flags(Some(1), Some("1,1,1")).is_err());
    }

    #[test]
    fn test_shape_rejects_oversized_counts() {
        let err = Shape::from_flags(Some(11), None).unwrap_err();
        assert!(err.to_string().contains("At most 10 keys"));
        assert!(Shape::from_flags(None, Some("11,0,0")).is_err());
        assert!(Shape::from_flags(Some(10), None).is_ok());
    }

    #[test]
    fn test_build_keyring_addresses() {
        let single = build_keyring(&Shape::Single, None, None).unwrap();
        assert!(!single.is_decoupled());

        let pinned = "0x00000000000000000000000000000000000000aa";
        let decoupled = build_keyring(&Shape::Single, Some(pinned), None).unwrap();
        assert_eq!(decoupled.address_hex(), pinned);
        assert!(decoupled.is_decoupled());

        let roles = build_keyring(&Shape::RoleBased(vec![2, 0, 1]), None, None).unwrap();
        assert_eq!(roles.key_count(), 3);

        assert!(build_keyring(&Shape::RoleBased(vec![0, 1, 1]), None, None).is_err());
        assert!(build_keyring(&Shape::Multiple(11), Some(pinned), None).is_err());
    }
}
