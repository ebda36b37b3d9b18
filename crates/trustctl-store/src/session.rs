//! Per-invocation orchestration of one store.
//!
//! ```text
//! Unmodified --backup--> BackedUp --remove--> Modified --restore--> BackedUp
//! ```
//!
//! `remove` from `Unmodified` fails with [`TrustError::NoBackup`] before the
//! store is read or written.

use serde::Serialize;
use tracing::{info, warn};
use trustctl_core::{CertRecord, RemovalPlan, Result, TrustError, Whitelist};

use crate::backup::{BackupArea, BackupRecord};
use crate::TrustStore;

/// Where a store stands within this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    /// Nothing done yet
    Unmodified,
    /// A backup was published this session
    BackedUp,
    /// Certificates were removed after the backup
    Modified,
}

/// What a whitelist run did (or would do).
#[derive(Debug, Clone, Serialize)]
pub struct RemovalReport {
    /// Certificates in the store before removal
    pub before: usize,
    /// Certificates kept by the whitelist
    pub retained: usize,
    /// Certificates removed (or that would be)
    pub removed: Vec<CertRecord>,
}

/// Drives one store through backup, removal and restore.
pub struct Session<'a, S: TrustStore + ?Sized> {
    store: &'a S,
    area: &'a BackupArea,
    state: StoreState,
    backup: Option<BackupRecord>,
}

impl<'a, S: TrustStore + ?Sized> Session<'a, S> {
    /// Start a session; no backup has been taken yet.
    pub const fn new(store: &'a S, area: &'a BackupArea) -> Self {
        Self {
            store,
            area,
            state: StoreState::Unmodified,
            backup: None,
        }
    }

    /// Current state.
    pub const fn state(&self) -> StoreState {
        self.state
    }

    /// Certificates currently trusted by the store.
    pub fn list(&self) -> Result<Vec<CertRecord>> {
        self.store.list()
    }

    /// Publish a fresh backup, replacing any previous one.
    pub fn backup(&mut self) -> Result<&BackupRecord> {
        let record = self.area.create(self.store)?;
        self.state = StoreState::BackedUp;
        Ok(self.backup.insert(record))
    }

    /// Publish a backup unless one was already taken in this session.
    pub fn ensure_backup(&mut self) -> Result<&BackupRecord> {
        let record = match self.backup.take() {
            Some(record) => record,
            None => {
                let record = self.area.create(self.store)?;
                self.state = StoreState::BackedUp;
                record
            }
        };
        Ok(self.backup.insert(record))
    }

    /// What [`Session::remove`] would delete, without touching the store.
    pub fn plan(&self, whitelist: &Whitelist) -> Result<RemovalReport> {
        let snapshot = self.store.list()?;
        let plan = RemovalPlan::new(&snapshot, whitelist);
        Ok(report(&snapshot, &plan))
    }

    /// Remove every certificate the whitelist does not match.
    ///
    /// Requires a backup from this session.
    pub fn remove(&mut self, whitelist: &Whitelist) -> Result<RemovalReport> {
        if self.state == StoreState::Unmodified {
            return Err(TrustError::NoBackup {
                store: self.store.id().to_string(),
            });
        }

        let snapshot = self.store.list()?;
        let plan = RemovalPlan::new(&snapshot, whitelist);
        if plan.is_empty() {
            info!(store = %self.store.id(), retained = plan.retained, "nothing to remove");
            return Ok(report(&snapshot, &plan));
        }
        if plan.retained == 0 {
            warn!(store = %self.store.id(), "whitelist matches nothing, removing every certificate");
        }

        self.store.remove(&plan.removable)?;
        self.state = StoreState::Modified;

        info!(
            store = %self.store.id(),
            removed = plan.removable.len(),
            retained = plan.retained,
            "removed certificates"
        );
        Ok(report(&snapshot, &plan))
    }

    /// Revert the store to its most recent backup on disk.
    pub fn restore(&mut self) -> Result<BackupRecord> {
        let id = self.store.id();
        let record = self
            .area
            .current(&id)?
            .ok_or_else(|| TrustError::NoBackupFound {
                store: id.to_string(),
                location: self.area.location(&id),
            })?;

        self.store.restore(&record.payload())?;
        self.state = StoreState::BackedUp;

        info!(
            store = %id,
            certs = record.len(),
            created_at = %record.created_at,
            "restored from backup"
        );
        Ok(record)
    }
}

fn report(snapshot: &[CertRecord], plan: &RemovalPlan<'_>) -> RemovalReport {
    RemovalReport {
        before: snapshot.len(),
        retained: plan.retained,
        removed: plan.removable.iter().map(|c| (*c).clone()).collect(),
    }
}
