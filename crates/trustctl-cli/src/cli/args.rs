//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use trustctl_store::StoreKind;

use crate::output::OutputFormat;

/// Certificate trust store remediation
///
/// Back up the platform trust store, remove every certificate a whitelist
/// does not name, and restore the original store when needed.
#[derive(Parser, Debug)]
#[command(name = "trustctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Trust store to operate on (linux, nss, java, keychain, windows)
    #[arg(short, long, global = true)]
    pub store: Option<StoreKind>,

    /// Directory holding backups
    #[arg(long, env = "TRUSTCTL_BACKUP_DIR", global = true)]
    pub backup_dir: Option<PathBuf>,

    /// Configuration file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(flatten)]
    pub locations: StoreLocations,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where each store kind lives, when not the detected default.
#[derive(Args, Debug, Default)]
pub struct StoreLocations {
    /// PEM certificate directory for the linux store
    #[arg(long, global = true, value_name = "DIR")]
    pub cert_dir: Option<PathBuf>,

    /// NSS database directory for the nss store
    #[arg(long, global = true, value_name = "DIR")]
    pub nss_db: Option<PathBuf>,

    /// cacerts keystore for the java store
    #[arg(long, global = true, value_name = "FILE")]
    pub keystore: Option<PathBuf>,

    /// Keychain for the keychain store (repeatable)
    #[arg(long, global = true, value_name = "FILE")]
    pub keychain: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List trusted certificates
    List(ListArgs),

    /// Back up the store, replacing any previous backup
    Backup,

    /// Remove every certificate the whitelist does not match
    Whitelist(WhitelistArgs),

    /// Restore the store from its backup
    Restore,

    /// Inspect CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// List command
// ============================================================================

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print only the number of certificates
    #[arg(long)]
    pub count: bool,
}

// ============================================================================
// Whitelist command
// ============================================================================

#[derive(Args, Debug)]
pub struct WhitelistArgs {
    /// Whitelist file (.json, .yaml or .yml)
    #[arg(short, long, allow_hyphen_values = true)]
    pub file: String,

    /// Show what would be removed without backing up or removing
    #[arg(long)]
    pub dry_run: bool,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print the configuration file path
    Path,
}
