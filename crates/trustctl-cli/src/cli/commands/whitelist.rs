//! `trustctl whitelist` - Remove everything the whitelist does not match.

use anyhow::Result;
use colored::Colorize;
use trustctl_core::Whitelist;
use trustctl_store::{RemovalReport, Session};

use super::Context;
use crate::cli::args::WhitelistArgs;
use crate::output::{self, OutputFormat};

pub fn execute(ctx: &Context, args: &WhitelistArgs) -> Result<()> {
    // A bad whitelist fails before the store is opened.
    let whitelist = Whitelist::load(&args.file)?;

    let store = ctx.open_store()?;
    let area = ctx.backup_area();
    let mut session = Session::new(&*store, &area);

    if args.dry_run {
        let report = session.plan(&whitelist)?;
        return print_report(ctx, &report, true);
    }

    let record = session.ensure_backup()?;
    if ctx.output_format == OutputFormat::Pretty {
        println!(
            "{} {} certificates to {}",
            "Backed up".green().bold(),
            record.len().to_string().cyan(),
            record.location.display()
        );
    }

    let report = session.remove(&whitelist)?;
    print_report(ctx, &report, false)
}

fn print_report(ctx: &Context, report: &RemovalReport, dry_run: bool) -> Result<()> {
    match ctx.output_format {
        OutputFormat::Json | OutputFormat::Yaml => {
            output::print_structured(ctx.output_format, report)?;
        }
        OutputFormat::Csv => {
            output::write_csv(std::io::stdout().lock(), &output::cert_rows(&report.removed))?;
        }
        OutputFormat::Pretty => {
            if !report.removed.is_empty() {
                let heading = if dry_run { "Would remove:" } else { "Removed:" };
                println!("{}", heading.bold().underline());
                println!("{}", output::cert_table(&output::cert_rows(&report.removed)));
                println!();
            }

            let verb = if dry_run { "would remove" } else { "removed" };
            println!(
                "{} {} of {} certificates, {} kept",
                verb.bold(),
                report.removed.len().to_string().red().bold(),
                report.before,
                report.retained.to_string().green().bold()
            );
            if dry_run {
                println!("{}", "Dry run: nothing was backed up or removed.".dimmed());
            }
        }
    }
    Ok(())
}
