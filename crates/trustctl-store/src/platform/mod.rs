//! Platform trust store backends.
//!
//! | Kind       | Backing                        | Restore      |
//! |------------|--------------------------------|--------------|
//! | `linux`    | flat PEM directory             | exact (tree) |
//! | `nss`      | NSS shared security database   | exact (files)|
//! | `java`     | Java `cacerts` keystore        | exact (file) |
//! | `keychain` | macOS keychains via `security` | best-effort  |
//! | `windows`  | `Cert:\LocalMachine\Root`      | best-effort  |

pub mod export;
pub mod java;
pub mod keychain;
pub mod nss;
pub mod pem_dir;
pub mod windows;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use trustctl_core::Result;

use crate::runner::SystemRunner;
use crate::TrustStore;

pub use java::JavaStore;
pub use keychain::KeychainStore;
pub use nss::NssStore;
pub use pem_dir::PemDirStore;
pub use windows::WindowsStore;

/// Which certificate database a store manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Flat PEM directory such as `/etc/ssl/certs`
    Linux,
    /// NSS shared database (Firefox, Chromium on Linux)
    Nss,
    /// Java `cacerts` keystore
    Java,
    /// macOS keychains
    Keychain,
    /// Windows certificate store
    Windows,
}

impl StoreKind {
    /// All kinds, in help-text order.
    pub const ALL: [Self; 5] = [
        Self::Linux,
        Self::Nss,
        Self::Java,
        Self::Keychain,
        Self::Windows,
    ];

    /// Lowercase name used on the command line and in backup keys.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Nss => "nss",
            Self::Java => "java",
            Self::Keychain => "keychain",
            Self::Windows => "windows",
        }
    }

    /// The operating system's own trust store kind.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_os = "macos") {
            Self::Keychain
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// True when Restore reproduces the backup exactly (file-backed stores).
    #[must_use]
    pub const fn restores_exactly(self) -> bool {
        matches!(self, Self::Linux | Self::Nss | Self::Java)
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" | "pem" => Ok(Self::Linux),
            "nss" | "firefox" | "chrome" => Ok(Self::Nss),
            "java" => Ok(Self::Java),
            "keychain" | "darwin" | "macos" => Ok(Self::Keychain),
            "windows" => Ok(Self::Windows),
            _ => Err(format!(
                "unknown store '{s}', expected one of: linux, nss, java, keychain, windows"
            )),
        }
    }
}

/// Identity of one concrete store: its kind plus what it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreId {
    /// Store kind
    pub kind: StoreKind,
    /// Directory, database, keystore or store name
    pub target: String,
}

impl StoreId {
    /// Build an identity.
    pub fn new(kind: StoreKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }

    /// Filesystem-safe key: `<kind>-<first 12 hex of sha256(target)>`.
    #[must_use]
    pub fn key(&self) -> String {
        let digest = trustctl_core::hash::sha256_hex(self.target.as_bytes());
        format!("{}-{}", self.kind, &digest[..12])
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.target)
    }
}

/// Per-kind location overrides. Unset fields fall back to detection.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// PEM directory for `linux`
    pub linux_cert_dir: Option<PathBuf>,
    /// Database directory for `nss`
    pub nss_db: Option<PathBuf>,
    /// `cacerts` path for `java`
    pub java_keystore: Option<PathBuf>,
    /// Keystore password for `java`
    pub java_storepass: Option<String>,
    /// Keychains for `keychain`
    pub keychains: Vec<PathBuf>,
}

/// Open a store of `kind` backed by the real platform tools.
pub fn open_store(kind: StoreKind, config: &StoreConfig) -> Result<Box<dyn TrustStore>> {
    let store: Box<dyn TrustStore> = match kind {
        StoreKind::Linux => match &config.linux_cert_dir {
            Some(dir) => Box::new(PemDirStore::new(dir)),
            None => Box::new(PemDirStore::detect()?),
        },
        StoreKind::Nss => match &config.nss_db {
            Some(dir) => Box::new(NssStore::new(dir, SystemRunner)),
            None => Box::new(NssStore::detect(SystemRunner)?),
        },
        StoreKind::Java => {
            let mut store = match &config.java_keystore {
                Some(path) => JavaStore::new(path, SystemRunner),
                None => JavaStore::detect(SystemRunner)?,
            };
            if let Some(pass) = &config.java_storepass {
                store = store.with_storepass(pass);
            }
            Box::new(store)
        }
        StoreKind::Keychain => {
            if config.keychains.is_empty() {
                Box::new(KeychainStore::system(SystemRunner))
            } else {
                Box::new(KeychainStore::new(config.keychains.clone(), SystemRunner))
            }
        }
        StoreKind::Windows => Box::new(WindowsStore::root(SystemRunner)),
    };
    Ok(store)
}
