//! klaykeys command line
//!
//! Creates, imports, lists and inspects Klaytn keystore files kept under a
//! home directory.

pub mod key_cli;

pub use key_cli::{execute_keys_command, KeysCommand};

/// Environment variable overriding the home directory
pub const KLAYKEYS_HOME_ENV: &str = "KLAYKEYS_HOME";

/// Home directory name under the user's home
pub const DEFAULT_HOME_DIR: &str = ".klaykeys";
