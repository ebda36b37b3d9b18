//! trustctl - certificate trust store remediation
//!
//! Back up a platform trust store, trim it down to a whitelist, and put it
//! back the way it was.

use colored::Colorize;
use std::process::ExitCode;

fn main() -> ExitCode {
    match trustctl_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), trustctl_cli::error_message(&err));
            ExitCode::from(trustctl_cli::exit_code(&err))
        }
    }
}
