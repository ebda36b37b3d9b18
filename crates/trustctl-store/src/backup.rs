//! Backup area: one current backup per store, published atomically.
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   linux-3fa2c1d9e0b4/
//!     manifest.json     store identity, creation time, sorted fingerprints
//!     payload/          whatever the store's backup() wrote
//! ```
//!
//! A backup is staged in a hidden temp directory under `<root>` and renamed
//! into place only after the store payload and the manifest are written.
//! A failed backup leaves the previous one untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};
use trustctl_core::{Result, TrustError};

use crate::fsutil;
use crate::platform::{StoreId, StoreKind};
use crate::TrustStore;

const MANIFEST_FILE: &str = "manifest.json";
const PAYLOAD_DIR: &str = "payload";

/// A published backup of one store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Store key (`<kind>-<hash>`)
    pub store: String,
    /// Store kind
    pub kind: StoreKind,
    /// What the store pointed at when backed up
    pub target: String,
    /// When the backup was taken
    pub created_at: DateTime<Utc>,
    /// SHA-256 fingerprints present at backup time, sorted
    pub fingerprints: Vec<String>,
    /// Directory holding this backup
    #[serde(skip)]
    pub location: PathBuf,
}

impl BackupRecord {
    /// Directory holding the store payload.
    #[must_use]
    pub fn payload(&self) -> PathBuf {
        self.location.join(PAYLOAD_DIR)
    }

    /// Number of certificates captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    /// True when the store was empty at backup time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

/// Directory holding the current backup of each store.
#[derive(Debug, Clone)]
pub struct BackupArea {
    root: PathBuf,
}

impl BackupArea {
    /// Backups live under `root`, which is created on first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Where the backup for `id` lives, whether or not it exists.
    #[must_use]
    pub fn location(&self, id: &StoreId) -> PathBuf {
        self.root.join(id.key())
    }

    /// Back up `store`, replacing any previous backup for it.
    pub fn create<S: TrustStore + ?Sized>(&self, store: &S) -> Result<BackupRecord> {
        let id = store.id();
        fs::create_dir_all(&self.root).map_err(|e| TrustError::io(&self.root, e))?;

        let staged = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.root)
            .map_err(|e| TrustError::io(&self.root, e))?;

        let snapshot = store.list()?;
        let payload = staged.path().join(PAYLOAD_DIR);
        fs::create_dir(&payload).map_err(|e| TrustError::io(&payload, e))?;
        store.backup(&payload)?;

        let mut fingerprints: Vec<String> = snapshot.into_iter().map(|c| c.fingerprint).collect();
        fingerprints.sort_unstable();
        fingerprints.dedup();

        let mut record = BackupRecord {
            store: id.key(),
            kind: id.kind,
            target: id.target.clone(),
            created_at: Utc::now(),
            fingerprints,
            location: PathBuf::new(),
        };
        let manifest = staged.path().join(MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(&record)?;
        fs::write(&manifest, json).map_err(|e| TrustError::io(&manifest, e))?;

        let location = self.location(&id);
        fsutil::swap_dir(staged.path(), &location, &self.root)?;
        record.location = location;

        info!(
            store = %id,
            certs = record.len(),
            location = %record.location.display(),
            "backup published"
        );
        Ok(record)
    }

    /// The current backup for `id`, if one has been published.
    pub fn current(&self, id: &StoreId) -> Result<Option<BackupRecord>> {
        let location = self.location(id);
        let manifest = location.join(MANIFEST_FILE);

        let content = match fs::read(&manifest) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(store = %id, location = %location.display(), "no backup on disk");
                return Ok(None);
            }
            Err(e) => return Err(TrustError::io(&manifest, e)),
        };

        let mut record: BackupRecord =
            serde_json::from_slice(&content).map_err(|e| TrustError::Parse {
                path: manifest.clone(),
                reason: e.to_string(),
            })?;
        record.location = location;
        Ok(Some(record))
    }
}
