//! Configuration management.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trustctl_store::{StoreConfig, StoreKind};

use crate::output::OutputFormat;

/// CLI configuration, read from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default store kind.
    pub store: Option<StoreKind>,

    /// Where backups are kept.
    pub backup_dir: Option<PathBuf>,

    /// Default output format.
    pub output_format: Option<OutputFormat>,

    /// PEM directory for the linux store.
    pub linux_cert_dir: Option<PathBuf>,

    /// NSS database directory.
    pub nss_db: Option<PathBuf>,

    /// Java keystore path.
    pub java_keystore: Option<PathBuf>,

    /// Java keystore password.
    pub java_storepass: Option<String>,

    /// Keychains for the keychain store.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keychains: Vec<PathBuf>,
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("io", "trustctl", "trustctl")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

impl Config {
    /// Get the default config file path.
    pub fn path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Default backup directory under the platform data dir.
    pub fn default_backup_dir() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("backups"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist; the default file may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config.expanded())
    }

    /// Store locations for [`trustctl_store::open_store`].
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            linux_cert_dir: self.linux_cert_dir.clone(),
            nss_db: self.nss_db.clone(),
            java_keystore: self.java_keystore.clone(),
            java_storepass: self.java_storepass.clone(),
            keychains: self.keychains.clone(),
        }
    }

    fn expanded(mut self) -> Self {
        for path in [
            &mut self.backup_dir,
            &mut self.linux_cert_dir,
            &mut self.nss_db,
            &mut self.java_keystore,
        ]
        .into_iter()
        .flatten()
        {
            *path = expand(path);
        }
        for path in &mut self.keychains {
            *path = expand(path);
        }
        self
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}
