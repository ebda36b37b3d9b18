//! `trustctl config` - Inspect CLI configuration.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::OutputFormat;

pub fn execute(ctx: &Context, args: &ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(ctx),
        ConfigCommands::Path => show_path(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    // Never echo the password itself
    let mut config = ctx.config.clone();
    if config.java_storepass.is_some() {
        config.java_storepass = Some("****".to_string());
    }

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&config)?);
        }
        _ => {
            let unset = || "(not set)".dimmed().to_string();
            let show = |p: Option<&PathBuf>| p.map_or_else(unset, |p| p.display().to_string());

            println!("{}", "Current Configuration:".bold());
            println!();
            println!(
                "  {} {}",
                "store:".bold(),
                config.store.map_or_else(unset, |k| k.to_string())
            );
            println!("  {} {}", "backup_dir:".bold(), show(config.backup_dir.as_ref()));
            println!(
                "  {} {}",
                "output_format:".bold(),
                config.output_format.map_or_else(unset, |f| f.to_string())
            );
            println!("  {} {}", "linux_cert_dir:".bold(), show(config.linux_cert_dir.as_ref()));
            println!("  {} {}", "nss_db:".bold(), show(config.nss_db.as_ref()));
            println!("  {} {}", "java_keystore:".bold(), show(config.java_keystore.as_ref()));

            println!(
                "  {} {}",
                "java_storepass:".bold(),
                config.java_storepass.clone().unwrap_or_else(unset)
            );

            let keychains = if config.keychains.is_empty() {
                unset()
            } else {
                config
                    .keychains
                    .iter()
                    .map(|k| k.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            println!("  {} {}", "keychains:".bold(), keychains);

            println!();
            println!("{}", "Effective:".bold());
            println!("  {} {}", "store:".bold(), ctx.store_kind.to_string().cyan());
            println!("  {} {}", "backup_dir:".bold(), ctx.backup_dir.display());
        }
    }

    Ok(())
}

fn show_path(ctx: &Context) -> Result<()> {
    let path = match &ctx.config_path {
        Some(path) => path.clone(),
        None => Config::path()?,
    };
    println!("{}", path.display());
    Ok(())
}
