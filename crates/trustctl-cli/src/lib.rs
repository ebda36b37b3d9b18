//! # trustctl-cli
//!
//! Command-line front end for the trust store engine.
//!
//! ## Commands
//!
//! - `list [--count]`: certificates in the selected store
//! - `backup`: publish a fresh backup
//! - `whitelist --file <path> [--dry-run]`: back up, then remove everything
//!   the whitelist does not match
//! - `restore`: put the store back from its backup
//! - `config show|path`: inspect the configuration file
//!
//! Every command takes `--store` and `--output` (pretty, json, yaml, csv).

pub mod cli;
pub mod config;
pub mod output;

pub use cli::{error_message, exit_code, run};
