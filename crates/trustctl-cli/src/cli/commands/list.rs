//! `trustctl list` - Show trusted certificates.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use super::Context;
use crate::cli::args::ListArgs;
use crate::output::{self, OutputFormat};

#[derive(Serialize)]
struct CountReport<'a> {
    store: &'a str,
    count: usize,
}

pub fn execute(ctx: &Context, args: &ListArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let certs = store.list()?;
    let id = store.id().to_string();

    if args.count {
        let report = CountReport {
            store: &id,
            count: certs.len(),
        };
        match ctx.output_format {
            OutputFormat::Json | OutputFormat::Yaml => {
                output::print_structured(ctx.output_format, &report)?;
            }
            OutputFormat::Csv => output::write_csv(std::io::stdout().lock(), &[report])?,
            OutputFormat::Pretty => println!("{}", certs.len()),
        }
        return Ok(());
    }

    match ctx.output_format {
        OutputFormat::Json | OutputFormat::Yaml => {
            output::print_structured(ctx.output_format, &certs)?;
        }
        OutputFormat::Csv => output::write_csv(std::io::stdout().lock(), &output::cert_rows(&certs))?,
        OutputFormat::Pretty => {
            println!("{} {}", "Store:".bold(), id.cyan());
            println!();
            if certs.is_empty() {
                println!("{}", "No certificates found.".dimmed());
            } else {
                println!("{}", output::cert_table(&output::cert_rows(&certs)));
                println!();
                println!("{} {}", "Total:".bold(), certs.len().to_string().cyan().bold());
            }
        }
    }

    Ok(())
}
