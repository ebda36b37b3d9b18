//! Certificate export payload for stores without file access.
//!
//! `keychain` and `windows` can only be read and written through platform
//! tools, so their backups are a JSON list of PEM certificates tagged with
//! the keychain or store they came from. Restoring re-adds each missing
//! certificate on its own and collects the refusals.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};
use trustctl_core::{extract, CertRecord, Result, TrustError};

const EXPORT_FILE: &str = "export.json";

/// One exported certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    /// Keychain path or store name to re-add into
    pub target: String,
    /// SHA-256 fingerprint
    pub fingerprint: String,
    /// Subject, for error messages
    pub subject: String,
    /// PEM encoding
    pub pem: String,
}

impl ExportEntry {
    /// Export `cert` for re-adding into `target`.
    pub fn new(target: impl Into<String>, cert: &CertRecord) -> Self {
        Self {
            target: target.into(),
            fingerprint: cert.fingerprint.clone(),
            subject: cert.display_name().to_string(),
            pem: cert.to_pem(),
        }
    }
}

/// Write `entries` into `staging`, sorted by fingerprint then target.
pub fn write_export(staging: &Path, mut entries: Vec<ExportEntry>) -> Result<()> {
    entries.sort_by(|a, b| {
        a.fingerprint
            .cmp(&b.fingerprint)
            .then_with(|| a.target.cmp(&b.target))
    });
    entries.dedup();

    let path = staging.join(EXPORT_FILE);
    let json = serde_json::to_vec_pretty(&entries)?;
    fs::write(&path, json).map_err(|e| TrustError::io(&path, e))?;
    debug!(path = %path.display(), certs = entries.len(), "wrote certificate export");
    Ok(())
}

/// Read the entries written by [`write_export`].
pub fn read_export(payload: &Path) -> Result<Vec<ExportEntry>> {
    let path = payload.join(EXPORT_FILE);
    let content = fs::read(&path).map_err(|e| TrustError::io(&path, e))?;
    serde_json::from_slice(&content).map_err(|e| TrustError::Parse {
        path,
        reason: e.to_string(),
    })
}

/// Re-add every exported certificate for which `is_present` is false.
///
/// `add` receives the entry and a temporary `.crt` file holding its PEM.
/// Failures are collected and reported together as
/// [`TrustError::PartialRestore`]; nothing is retried.
pub fn reimport<P, F>(store: &str, entries: &[ExportEntry], is_present: P, mut add: F) -> Result<usize>
where
    P: Fn(&ExportEntry) -> bool,
    F: FnMut(&ExportEntry, &Path) -> Result<()>,
{
    let mut added = 0;
    let mut failed = Vec::new();

    for entry in entries {
        if is_present(entry) {
            continue;
        }
        if let Err(e) = extract::parse_pem(entry.pem.as_bytes(), &entry.subject) {
            failed.push(format!("{} ({}): {e}", entry.fingerprint, entry.subject));
            continue;
        }

        let mut file = tempfile::Builder::new()
            .prefix("trustctl-")
            .suffix(".crt")
            .tempfile()
            .map_err(|e| TrustError::io(std::env::temp_dir(), e))?;
        file.write_all(entry.pem.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| TrustError::io(file.path(), e))?;

        match add(entry, file.path()) {
            Ok(()) => added += 1,
            Err(e) => {
                warn!(store, fingerprint = %entry.fingerprint, error = %e, "certificate not re-added");
                failed.push(format!("{} ({}): {e}", entry.fingerprint, entry.subject));
            }
        }
    }

    if failed.is_empty() {
        Ok(added)
    } else {
        Err(TrustError::PartialRestore {
            store: store.to_string(),
            failed,
        })
    }
}
