//! `trustctl restore` - Put the store back from its backup.

use anyhow::Result;
use colored::Colorize;
use trustctl_store::Session;

use super::Context;
use crate::output::{self, OutputFormat};

pub fn execute(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let area = ctx.backup_area();
    let mut session = Session::new(&*store, &area);
    let record = session.restore()?;

    match ctx.output_format {
        OutputFormat::Pretty | OutputFormat::Csv => {
            println!(
                "{} Restored {} from backup taken {}",
                "Success:".green().bold(),
                store.id(),
                record.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string().cyan()
            );
            if !ctx.store_kind.restores_exactly() {
                println!(
                    "{}",
                    "Note: certificates added since the backup were left in place.".dimmed()
                );
            }
        }
        format => {
            output::print_structured(format, &record)?;
        }
    }

    Ok(())
}
