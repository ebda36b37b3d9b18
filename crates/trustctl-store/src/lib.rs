//! # trustctl-store
//!
//! Platform trust stores with backup, whitelist removal and restore.
//!
//! Every backend implements [`TrustStore`]. A [`Session`] drives one store
//! through a CLI invocation and refuses to remove anything until a backup
//! has been published to the [`BackupArea`].
//!
//! ## Data Flow
//!
//! ```text
//! whitelist:  Session::ensure_backup()
//!               -> TrustStore::list() + TrustStore::backup(staging)
//!               -> BackupArea publishes <root>/<store-key>/{manifest.json,payload/}
//!             Session::remove(whitelist)
//!               -> TrustStore::list() -> find_removable() -> TrustStore::remove()
//!
//! restore:    Session::restore()
//!               -> BackupArea::current() -> TrustStore::restore(payload)
//! ```
//!
//! Store operations assume exclusive access to the underlying database.
//! Nothing here locks it; do not run two invocations against one store.

pub mod backup;
pub mod fsutil;
pub mod platform;
pub mod runner;
pub mod session;

pub use backup::{BackupArea, BackupRecord};
pub use platform::{open_store, StoreConfig, StoreId, StoreKind};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use session::{RemovalReport, Session, StoreState};

use std::path::Path;
use trustctl_core::{CertRecord, Result};

/// The capability set every platform store provides.
pub trait TrustStore {
    /// Identity used to key backups.
    fn id(&self) -> StoreId;

    /// Every certificate currently trusted, read from the live store.
    fn list(&self) -> Result<Vec<CertRecord>>;

    /// Write a payload into `staging` from which [`TrustStore::restore`]
    /// can rebuild the current contents. `staging` is an empty directory
    /// that is discarded unless this returns `Ok`.
    fn backup(&self, staging: &Path) -> Result<()>;

    /// Delete exactly these entries from the live store.
    fn remove(&self, removable: &[&CertRecord]) -> Result<()>;

    /// Rebuild the live store from a payload written by
    /// [`TrustStore::backup`].
    fn restore(&self, payload: &Path) -> Result<()>;
}

impl<T: TrustStore + ?Sized> TrustStore for Box<T> {
    fn id(&self) -> StoreId {
        (**self).id()
    }

    fn list(&self) -> Result<Vec<CertRecord>> {
        (**self).list()
    }

    fn backup(&self, staging: &Path) -> Result<()> {
        (**self).backup(staging)
    }

    fn remove(&self, removable: &[&CertRecord]) -> Result<()> {
        (**self).remove(removable)
    }

    fn restore(&self, payload: &Path) -> Result<()> {
        (**self).restore(payload)
    }
}
