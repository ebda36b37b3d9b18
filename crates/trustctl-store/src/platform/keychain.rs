//! macOS keychains, driven through `security`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use trustctl_core::{extract, CertRecord, Result};

use crate::platform::export::{self, ExportEntry};
use crate::platform::{StoreId, StoreKind};
use crate::runner::{run_tool, CommandRunner};
use crate::TrustStore;

const SECURITY: &str = "security";

/// Keychains consulted for system-wide trust.
pub const SYSTEM_KEYCHAINS: &[&str] = &[
    "/Library/Keychains/System.keychain",
    "/System/Library/Keychains/SystemRootCertificates.keychain",
];

/// Trust store spanning one or more keychains.
#[derive(Debug, Clone)]
pub struct KeychainStore<R> {
    keychains: Vec<PathBuf>,
    runner: R,
}

impl<R: CommandRunner> KeychainStore<R> {
    /// The system keychains.
    pub fn system(runner: R) -> Self {
        Self::new(SYSTEM_KEYCHAINS.iter().map(PathBuf::from).collect(), runner)
    }

    /// Explicit keychain files.
    pub fn new(keychains: Vec<PathBuf>, runner: R) -> Self {
        Self { keychains, runner }
    }

    /// Keychains this store spans.
    #[must_use]
    pub fn keychains(&self) -> &[PathBuf] {
        &self.keychains
    }

    fn list_keychain(&self, keychain: &Path) -> Result<Vec<CertRecord>> {
        let kc = keychain.to_string_lossy();
        let stdout = run_tool(
            &self.runner,
            StoreKind::Keychain,
            SECURITY,
            &["find-certificate", "-a", "-p", &*kc],
        )?;
        let mut seen = HashSet::new();
        let mut certs = extract::parse_pem(&stdout, &kc)?;
        certs.retain(|c| seen.insert(c.fingerprint.clone()));
        debug!(keychain = %kc, certs = certs.len(), "listed keychain");
        Ok(certs)
    }
}

impl<R: CommandRunner> TrustStore for KeychainStore<R> {
    fn id(&self) -> StoreId {
        let target = self
            .keychains
            .iter()
            .map(|k| k.display().to_string())
            .collect::<Vec<_>>()
            .join(":");
        StoreId::new(StoreKind::Keychain, target)
    }

    /// Certificates from every keychain. One certificate present in two
    /// keychains is listed once per keychain.
    fn list(&self) -> Result<Vec<CertRecord>> {
        let mut certs = Vec::new();
        for keychain in &self.keychains {
            certs.extend(self.list_keychain(keychain)?);
        }
        Ok(certs)
    }

    fn backup(&self, staging: &Path) -> Result<()> {
        let entries = self
            .list()?
            .iter()
            .map(|c| ExportEntry::new(&c.source, c))
            .collect();
        export::write_export(staging, entries)
    }

    fn remove(&self, removable: &[&CertRecord]) -> Result<()> {
        for cert in removable {
            let thumbprint = cert.sha1.to_ascii_uppercase();
            run_tool(
                &self.runner,
                StoreKind::Keychain,
                SECURITY,
                &["delete-certificate", "-Z", thumbprint.as_str(), cert.source.as_str()],
            )?;
            info!(keychain = %cert.source, thumbprint = %thumbprint, subject = %cert.display_name(), "removed certificate");
        }
        Ok(())
    }

    fn restore(&self, payload: &Path) -> Result<()> {
        let entries = export::read_export(payload)?;

        // Presence is per keychain: a root in System.keychain does not
        // stand in for one exported from SystemRootCertificates.
        let mut present: HashSet<(String, String)> = HashSet::new();
        for keychain in &self.keychains {
            let kc = keychain.display().to_string();
            present.extend(
                self.list_keychain(keychain)?
                    .into_iter()
                    .map(|c| (kc.clone(), c.fingerprint)),
            );
        }

        let added = export::reimport(
            StoreKind::Keychain.name(),
            &entries,
            |entry| present.contains(&(entry.target.clone(), entry.fingerprint.clone())),
            |entry, file| {
                let file = file.to_string_lossy();
                run_tool(
                    &self.runner,
                    StoreKind::Keychain,
                    SECURITY,
                    &["add-trusted-cert", "-d", "-r", "trustRoot", "-k", entry.target.as_str(), &*file],
                )?;
                Ok(())
            },
        )?;
        info!(added, "re-added certificates");
        Ok(())
    }
}
