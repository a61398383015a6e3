//! Message signing command implementation

use super::common::{get_passphrase, open_existing_store, resolve_keys_dir};
use anyhow::{anyhow, Context, Result};
use klaykeys_crypto::encoding::parse_address;
use klaykeys_crypto::{Keyring, RoleGroup};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Execute the sign-message command
pub fn execute(
    home: &Path,
    address: &str,
    message: &str,
    role: &str,
    index: Option<i64>,
    keys_dir: Option<PathBuf>,
    passphrase_file: Option<PathBuf>,
) -> Result<()> {
    let role: RoleGroup = role.parse().map_err(|e: String| anyhow!(e))?;
    let keys_dir = resolve_keys_dir(home, keys_dir);
    let store = open_existing_store(&keys_dir)?;
    let keystore = store.load(&parse_address(address)?)?;

    let passphrase = get_passphrase(
        passphrase_file.as_deref(),
        "Enter passphrase to unlock keystore: ",
        false,
    )?;
    let keyring = Keyring::decrypt(&keystore, &passphrase).context("Failed to decrypt keystore")?;

    let signed = match index {
        Some(index) => keyring.sign_prefixed_message_at(message, role, index)?,
        None => keyring.sign_prefixed_message(message, role)?,
    };
    debug!(address = %keyring.address_hex(), %role, signatures = signed.signatures.len(), "Signed message");

    println!("{}", serde_json::to_string_pretty(&signed)?);
    Ok(())
}
