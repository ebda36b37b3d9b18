//! Command implementations.

pub mod backup;
pub mod config;
pub mod list;
pub mod restore;
pub mod whitelist;

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;
use trustctl_store::{BackupArea, StoreConfig, StoreKind, TrustStore};

use crate::config::Config;
use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output format
    pub output_format: OutputFormat,

    /// Store kind selected by flag, config or platform
    pub store_kind: StoreKind,

    /// Store location overrides
    pub store_config: StoreConfig,

    /// Directory holding backups
    pub backup_dir: PathBuf,

    /// `--config` as given, if any
    pub config_path: Option<PathBuf>,

    /// Loaded configuration file
    pub config: Config,
}

impl Context {
    /// Open the selected store.
    pub fn open_store(&self) -> Result<Box<dyn TrustStore>> {
        let store = trustctl_store::open_store(self.store_kind, &self.store_config)?;
        debug!(store = %store.id(), "opened store");
        Ok(store)
    }

    /// The backup area under `backup_dir`.
    pub fn backup_area(&self) -> BackupArea {
        BackupArea::new(&self.backup_dir)
    }
}
