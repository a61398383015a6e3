//! Key list command implementation
//!
//! Lists all keystores in a directory with their public information.

use super::common::{open_existing_store, resolve_keys_dir};
use anyhow::Result;
use klaykeys_crypto::KeyStoreSummary;
use std::path::{Path, PathBuf};

/// Execute the list command
pub fn execute(home: &Path, keys_dir: Option<PathBuf>, format: &str) -> Result<()> {
    let keys_dir = resolve_keys_dir(home, keys_dir);
    let store = open_existing_store(&keys_dir)?;
    let keystores = store.list()?;

    if keystores.is_empty() && format != "json" {
        println!("No keystores found in {}", keys_dir.display());
        println!();
        println!("Run 'klaykeys keys generate' to create a new keyring.");
        return Ok(());
    }

    match format {
        "json" => print_json(&keystores)?,
        _ => print_text(&keystores, &keys_dir),
    }

    Ok(())
}

fn print_text(keystores: &[KeyStoreSummary], keys_dir: &Path) {
    println!("Keystores in {}", keys_dir.display());
    println!();

    for ks in keystores {
        println!("  {} (v{}, {})", ks.address, ks.version, ks.id);
        println!("    {} key(s), {}", ks.key_count, ks.shape);
    }

    println!();
    println!("Total: {} keystore(s)", keystores.len());
}

fn print_json(keystores: &[KeyStoreSummary]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(keystores)?);
    Ok(())
}
