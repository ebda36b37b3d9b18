//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use trustctl_core::TrustError;
use trustctl_store::{StoreConfig, StoreKind};

use crate::config::{self, Config};
use crate::output::OutputFormat;

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Flags override the config file, which overrides detection
    let output_format = cli
        .output
        .or(config.output_format)
        .unwrap_or(OutputFormat::Pretty);
    let store_kind = cli.store.or(config.store).unwrap_or_else(StoreKind::native);
    let backup_dir = match cli
        .backup_dir
        .as_deref()
        .map(config::expand)
        .or_else(|| config.backup_dir.clone())
    {
        Some(dir) => dir,
        None => Config::default_backup_dir()?,
    };

    let defaults = config.store_config();
    let locations = cli.locations;
    let store_config = StoreConfig {
        linux_cert_dir: locations
            .cert_dir
            .as_deref()
            .map(config::expand)
            .or(defaults.linux_cert_dir),
        nss_db: locations.nss_db.as_deref().map(config::expand).or(defaults.nss_db),
        java_keystore: locations
            .keystore
            .as_deref()
            .map(config::expand)
            .or(defaults.java_keystore),
        java_storepass: defaults.java_storepass,
        keychains: if locations.keychain.is_empty() {
            defaults.keychains
        } else {
            locations.keychain.iter().map(|p| config::expand(p)).collect()
        },
    };

    // Create context for commands
    let ctx = commands::Context {
        output_format,
        store_kind,
        store_config,
        backup_dir,
        config_path: cli.config,
        config,
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::List(args) => commands::list::execute(&ctx, &args),
        Commands::Backup => commands::backup::execute(&ctx),
        Commands::Whitelist(args) => commands::whitelist::execute(&ctx, &args),
        Commands::Restore => commands::restore::execute(&ctx),
        Commands::Config(args) => commands::config::execute(&ctx, &args),
    }
}

/// Process exit code for an error returned by [`run`].
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<TrustError>()
        .map_or(1, TrustError::exit_code)
}

/// `<category>: <message>` for engine errors, the plain chain otherwise.
pub fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<TrustError>() {
        Some(trust) => format!("{}: {err:#}", trust.category()),
        None => format!("{err:#}"),
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Only fails if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
