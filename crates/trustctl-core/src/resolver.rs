//! Removal resolution: which trusted certificates the whitelist disallows.

use serde::Serialize;
use tracing::trace;

use crate::types::{CertRecord, Whitelist};

/// Certificates in `snapshot` that no whitelist item matches.
///
/// Order follows the snapshot. An empty whitelist makes everything
/// removable; an empty snapshot yields an empty result, which means
/// "nothing to remove".
#[must_use]
pub fn find_removable<'a>(snapshot: &'a [CertRecord], whitelist: &Whitelist) -> Vec<&'a CertRecord> {
    snapshot
        .iter()
        .filter(|cert| {
            let allowed = whitelist.allows(cert);
            trace!(fingerprint = %cert.fingerprint, allowed, "resolved certificate");
            !allowed
        })
        .collect()
}

/// The outcome of resolving a snapshot against a whitelist.
#[derive(Debug, Clone, Serialize)]
pub struct RemovalPlan<'a> {
    /// Certificates to delete from the store
    pub removable: Vec<&'a CertRecord>,
    /// Number of certificates kept
    pub retained: usize,
}

impl<'a> RemovalPlan<'a> {
    /// Resolve `snapshot` against `whitelist`.
    #[must_use]
    pub fn new(snapshot: &'a [CertRecord], whitelist: &Whitelist) -> Self {
        let removable = find_removable(snapshot, whitelist);
        Self {
            retained: snapshot.len() - removable.len(),
            removable,
        }
    }

    /// True when nothing needs removing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removable.is_empty()
    }
}
