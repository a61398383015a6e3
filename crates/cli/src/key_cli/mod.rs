//! Key management commands for Klaytn keystores
//!
//! - `generate`: Create a new keyring and store it encrypted
//! - `import`: Encrypt an existing private key or wallet key
//! - `list`: List all keystores in a directory
//! - `export`: Show public keys and account key material (never private keys)
//! - `sign-message`: Sign a message with the Klaytn signed-message prefix
//!
//! # Security Features
//!
//! - Keys are stored as version 4 (or version 3) keystore JSON files
//! - Passphrases are read securely from terminal (not echoed)
//! - Passphrases and key material are zeroed when dropped

pub mod common;
pub mod export;
pub mod generate;
pub mod import;
pub mod list;
pub mod sign;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

/// Key management subcommands
#[derive(Subcommand)]
pub enum KeysCommand {
    /// Generate a new keyring
    ///
    /// Without shape flags a single key is generated and the account address
    /// is derived from it. Multi-key keyrings use `--address` when given,
    /// otherwise the address derived from the first transaction key.
    Generate {
        /// Generate a multiple-key keyring holding this many keys
        #[arg(long, conflicts_with = "role_based")]
        multiple: Option<usize>,

        /// Generate a role-based keyring; per-role key counts, e.g. "2,1,1"
        #[arg(long)]
        role_based: Option<String>,

        /// Account address for multi-key keyrings
        #[arg(long)]
        address: Option<String>,

        /// Key derivation function (scrypt, pbkdf2)
        #[arg(long, default_value = "scrypt")]
        kdf: String,

        /// Write a version 3 keystore (single keys only)
        #[arg(long)]
        v3: bool,

        /// Extra entropy mixed into key generation
        #[arg(long)]
        entropy: Option<String>,

        /// Directory containing keystore files
        #[arg(long)]
        keys_dir: Option<PathBuf>,

        /// Read passphrase from file instead of prompting
        #[arg(long)]
        passphrase_file: Option<PathBuf>,

        /// Dry run: show what would be created without writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// Import private keys into an encrypted keystore
    ///
    /// Accepts a raw hex private key or a `<key>0x00<address>` wallet key.
    /// A key file may list several raw keys, one per line, to build a
    /// multiple-key keyring for `--address`.
    Import {
        /// Read keys from file instead of prompting
        #[arg(long)]
        key_file: Option<PathBuf>,

        /// Account address; makes a single key decoupled when it differs
        #[arg(long)]
        address: Option<String>,

        /// Key derivation function (scrypt, pbkdf2)
        #[arg(long, default_value = "scrypt")]
        kdf: String,

        /// Write a version 3 keystore (single keys only)
        #[arg(long)]
        v3: bool,

        /// Directory containing keystore files
        #[arg(long)]
        keys_dir: Option<PathBuf>,

        /// Read passphrase from file instead of prompting
        #[arg(long)]
        passphrase_file: Option<PathBuf>,

        /// Overwrite an existing keystore for the same address
        #[arg(long)]
        force: bool,
    },

    /// List all keystores in a directory
    ///
    /// Does not require passphrases (only reads public information).
    List {
        /// Directory containing keystore files
        #[arg(long)]
        keys_dir: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Export public key information
    ///
    /// Decrypts the keystore to derive public keys and the account key
    /// configuration. Never exports private keys.
    Export {
        /// Account address of the keystore
        #[arg(long)]
        address: String,

        /// Output compressed public keys
        #[arg(long)]
        compressed: bool,

        /// Output format (json, text)
        #[arg(long, default_value = "text")]
        format: String,

        /// Directory containing keystore files
        #[arg(long)]
        keys_dir: Option<PathBuf>,

        /// Read passphrase from file instead of prompting
        #[arg(long)]
        passphrase_file: Option<PathBuf>,
    },

    /// Sign a message with the Klaytn signed-message prefix
    #[command(name = "sign-message")]
    SignMessage {
        /// Account address of the keystore
        #[arg(long)]
        address: String,

        /// Message to sign
        #[arg(long)]
        message: String,

        /// Role whose keys sign (transaction, account_update, fee_payer)
        #[arg(long, default_value = "transaction")]
        role: String,

        /// Sign with a single key at this index instead of every key
        #[arg(long, allow_hyphen_values = true)]
        index: Option<i64>,

        /// Directory containing keystore files
        #[arg(long)]
        keys_dir: Option<PathBuf>,

        /// Read passphrase from file instead of prompting
        #[arg(long)]
        passphrase_file: Option<PathBuf>,
    },
}

/// Execute a keys command
pub fn execute_keys_command(home: &std::path::Path, command: KeysCommand) -> Result<()> {
    match command {
        KeysCommand::Generate {
            multiple,
            role_based,
            address,
            kdf,
            v3,
            entropy,
            keys_dir,
            passphrase_file,
            dry_run,
        } => generate::execute(
            home,
            generate::Shape::from_flags(multiple, role_based.as_deref())?,
            address.as_deref(),
            &kdf,
            v3,
            entropy.as_deref(),
            keys_dir,
            passphrase_file,
            dry_run,
        ),

        KeysCommand::Import {
            key_file,
            address,
            kdf,
            v3,
            keys_dir,
            passphrase_file,
            force,
        } => import::execute(
            home,
            key_file,
            address.as_deref(),
            &kdf,
            v3,
            keys_dir,
            passphrase_file,
            force,
        ),

        KeysCommand::List { keys_dir, format } => list::execute(home, keys_dir, &format),

        KeysCommand::Export {
            address,
            compressed,
            format,
            keys_dir,
            passphrase_file,
        } => export::execute(home, &address, compressed, &format, keys_dir, passphrase_file),

        KeysCommand::SignMessage {
            address,
            message,
            role,
            index,
            keys_dir,
            passphrase_file,
        } => sign::execute(
            home,
            &address,
            &message,
            &role,
            index,
            keys_dir,
            passphrase_file,
        ),
    }
}
