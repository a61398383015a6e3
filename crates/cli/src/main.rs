//! klaykeys CLI
//!
//! Key management for Klaytn accounts backed by encrypted keystore files.

use anyhow::Result;
use clap::{Parser, Subcommand};
use klaykeys_cli::{execute_keys_command, KeysCommand, DEFAULT_HOME_DIR, KLAYKEYS_HOME_ENV};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Klaytn key management
#[derive(Parser)]
#[command(name = "klaykeys")]
#[command(version)]
#[command(about = "Klaytn keyring and keystore management", long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Directory for keystores
    #[arg(long, global = true, default_value_os_t = default_home_dir())]
    home: PathBuf,

    /// The logging level (trace|debug|info|warn|error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// The logging format (json|plain)
    #[arg(long, global = true, default_value = "plain")]
    log_format: String,

    /// Disable colored logs
    #[arg(long, global = true, default_value = "false")]
    log_no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage keyrings stored as encrypted keystores
    Keys {
        #[command(subcommand)]
        command: KeysCommand,
    },

    /// Print the version information
    Version,
}

fn default_home_dir() -> PathBuf {
    if let Ok(home) = std::env::var(KLAYKEYS_HOME_ENV) {
        return PathBuf::from(home);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_HOME_DIR)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, &cli.log_format, cli.log_no_color);

    match cli.command {
        Commands::Keys { command } => execute_keys_command(&cli.home, command),
        Commands::Version => {
            println!("klaykeys {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing(log_level: &str, log_format: &str, no_color: bool) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    // Logs go to stderr so command output stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr);

    match log_format {
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}
