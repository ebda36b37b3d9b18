//! `trustctl backup` - Snapshot the store.

use anyhow::Result;
use colored::Colorize;
use trustctl_store::Session;

use super::Context;
use crate::output::{self, OutputFormat};

pub fn execute(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let area = ctx.backup_area();
    let mut session = Session::new(&*store, &area);
    let record = session.backup()?;

    match ctx.output_format {
        OutputFormat::Pretty | OutputFormat::Csv => {
            println!(
                "{} Backed up {} certificates from {}",
                "Success:".green().bold(),
                record.len().to_string().cyan(),
                store.id()
            );
            println!("  {} {}", "Location:".bold(), record.location.display());
        }
        format => {
            output::print_structured(format, record)?;
        }
    }

    Ok(())
}
