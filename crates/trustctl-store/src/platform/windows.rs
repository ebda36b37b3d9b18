//! Windows certificate store (`Cert:\LocalMachine\<name>`).
//!
//! Listing goes through PowerShell, which prints each certificate's raw DER
//! as one base64 line. Removal and re-adding use `certutil`, addressed by
//! SHA-1 thumbprint.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};
use trustctl_core::{extract, CertRecord, Result, TrustError};

use crate::platform::export::{self, ExportEntry};
use crate::platform::{StoreId, StoreKind};
use crate::runner::{invoke, run_tool, CommandRunner};
use crate::TrustStore;

const POWERSHELL: &str = "powershell";
const CERTUTIL: &str = "certutil";

/// Trust store backed by a Windows system certificate store.
#[derive(Debug, Clone)]
pub struct WindowsStore<R> {
    store_name: String,
    runner: R,
}

impl<R: CommandRunner> WindowsStore<R> {
    /// The machine-wide trusted root store.
    pub fn root(runner: R) -> Self {
        Self::new("Root", runner)
    }

    /// A named store under `Cert:\LocalMachine`.
    pub fn new(store_name: impl Into<String>, runner: R) -> Self {
        Self {
            store_name: store_name.into(),
            runner,
        }
    }

    fn list_script(&self) -> String {
        format!(
            "Get-ChildItem -Path Cert:\\LocalMachine\\{} | ForEach-Object {{ [Convert]::ToBase64String($_.RawData) }}",
            self.store_name
        )
    }

    fn add(&self, target: &str, file: &Path) -> Result<()> {
        let file = file.to_string_lossy();
        run_tool(&self.runner, StoreKind::Windows, CERTUTIL, &["-addstore", "-f", target, &*file])?;
        Ok(())
    }
}

/// Decode PowerShell's one-base64-line-per-certificate output.
fn parse_listing(stdout: &[u8], store_name: &str) -> Vec<CertRecord> {
    let text = String::from_utf8_lossy(stdout);
    let mut certs = Vec::new();

    for (n, line) in text.lines().map(str::trim).filter(|l| !l.is_empty()).enumerate() {
        let der = match STANDARD.decode(line) {
            Ok(der) => der,
            Err(e) => {
                warn!(store = store_name, line = n + 1, error = %e, "skipping undecodable entry");
                continue;
            }
        };
        let source = format!("Cert:\\LocalMachine\\{store_name}");
        match extract::parse_der(&der, &source) {
            Ok(cert) => certs.push(cert),
            Err(e) => debug!(store = store_name, line = n + 1, error = %e, "skipping unparseable certificate"),
        }
    }
    certs
}

impl<R: CommandRunner> TrustStore for WindowsStore<R> {
    fn id(&self) -> StoreId {
        StoreId::new(StoreKind::Windows, &self.store_name)
    }

    fn list(&self) -> Result<Vec<CertRecord>> {
        let script = self.list_script();
        let stdout = run_tool(
            &self.runner,
            StoreKind::Windows,
            POWERSHELL,
            &["-NoProfile", "-NonInteractive", "-Command", script.as_str()],
        )?;
        let certs = parse_listing(&stdout, &self.store_name);
        debug!(store = %self.store_name, certs = certs.len(), "listed Windows store");
        Ok(certs)
    }

    fn backup(&self, staging: &Path) -> Result<()> {
        let entries = self
            .list()?
            .iter()
            .map(|c| ExportEntry::new(&self.store_name, c))
            .collect();
        export::write_export(staging, entries)
    }

    fn remove(&self, removable: &[&CertRecord]) -> Result<()> {
        for cert in removable {
            let output = invoke(
                &self.runner,
                StoreKind::Windows,
                CERTUTIL,
                &["-delstore", self.store_name.as_str(), cert.sha1.as_str()],
            )?;
            if !output.success() {
                let stderr = output.stderr_text();
                let lower = stderr.to_ascii_lowercase();
                if lower.contains("cannot find") || lower.contains("not found") {
                    debug!(thumbprint = %cert.sha1, "already gone");
                    continue;
                }
                return Err(TrustError::Command {
                    program: CERTUTIL.to_string(),
                    status: output.status,
                    stderr,
                });
            }
            info!(store = %self.store_name, thumbprint = %cert.sha1, subject = %cert.display_name(), "removed certificate");
        }
        Ok(())
    }

    fn restore(&self, payload: &Path) -> Result<()> {
        let entries = export::read_export(payload)?;
        let present: HashSet<String> = self.list()?.into_iter().map(|c| c.fingerprint).collect();
        let added = export::reimport(
            StoreKind::Windows.name(),
            &entries,
            |entry| present.contains(&entry.fingerprint),
            |entry, file| self.add(&entry.target, file),
        )?;
        info!(store = %self.store_name, added, "re-added certificates");
        Ok(())
    }
}
