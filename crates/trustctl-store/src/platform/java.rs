//! Java `cacerts` keystores, driven through `keytool`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use trustctl_core::{extract, CertRecord, Result, TrustError};

use crate::fsutil;
use crate::platform::{StoreId, StoreKind};
use crate::runner::{run_tool, CommandRunner};
use crate::TrustStore;

const KEYSTORE_FILE: &str = "cacerts";
const DEFAULT_STOREPASS: &str = "changeit";

/// Distribution-managed keystores, checked when `JAVA_HOME` has none.
pub const SYSTEM_KEYSTORES: &[&str] = &[
    // Debian / Ubuntu
    "/etc/ssl/certs/java/cacerts",
    // Fedora / RHEL
    "/etc/pki/java/cacerts",
    "/etc/pki/ca-trust/extracted/java/cacerts",
    "/usr/lib/jvm/default-java/lib/security/cacerts",
];

/// Trust store backed by a Java keystore file.
#[derive(Debug, Clone)]
pub struct JavaStore<R> {
    keystore: PathBuf,
    storepass: String,
    keytool: String,
    runner: R,
}

impl<R: CommandRunner> JavaStore<R> {
    /// Keystore at `keystore`, using `keytool` from `PATH`.
    pub fn new(keystore: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            keystore: keystore.into(),
            storepass: DEFAULT_STOREPASS.to_string(),
            keytool: "keytool".to_string(),
            runner,
        }
    }

    /// `$JAVA_HOME`'s keystore and keytool, else a distribution keystore.
    pub fn detect(runner: R) -> Result<Self> {
        if let Some(home) = env::var_os("JAVA_HOME").map(PathBuf::from) {
            let candidates = [
                home.join("lib/security/cacerts"),
                home.join("jre/lib/security/cacerts"),
            ];
            if let Some(keystore) = candidates.into_iter().find(|p| p.is_file()) {
                let mut store = Self::new(keystore, runner);
                let keytool = home.join("bin").join(if cfg!(windows) { "keytool.exe" } else { "keytool" });
                if keytool.is_file() {
                    store.keytool = keytool.display().to_string();
                }
                return Ok(store);
            }
            debug!(java_home = %home.display(), "no keystore under JAVA_HOME");
        }

        SYSTEM_KEYSTORES
            .iter()
            .map(Path::new)
            .find(|p| p.is_file())
            .map(|p| Self::new(p, runner))
            .ok_or_else(|| {
                TrustError::unavailable(
                    StoreKind::Java.name(),
                    "no cacerts keystore found (set JAVA_HOME or --keystore)",
                )
            })
    }

    /// Use `storepass` instead of the default `changeit`.
    #[must_use]
    pub fn with_storepass(mut self, storepass: impl Into<String>) -> Self {
        self.storepass = storepass.into();
        self
    }

    fn keytool(&self, args: &[&str]) -> Result<Vec<u8>> {
        let keystore = self.keystore.to_string_lossy();
        let mut full = args.to_vec();
        full.extend_from_slice(&["-keystore", &*keystore, "-storepass", self.storepass.as_str(), "-noprompt"]);
        run_tool(&self.runner, StoreKind::Java, &self.keytool, &full)
    }

    fn require_keystore(&self) -> Result<()> {
        if self.keystore.is_file() {
            Ok(())
        } else {
            Err(TrustError::unavailable(
                StoreKind::Java.name(),
                format!("{} is not a file", self.keystore.display()),
            ))
        }
    }
}

/// `(alias, pem)` pairs from `keytool -list -rfc` output.
fn parse_keytool_rfc(listing: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut alias: Option<String> = None;
    let mut block: Option<String> = None;

    for line in listing.lines().map(str::trim_end) {
        if let Some(name) = line.strip_prefix("Alias name:") {
            alias = Some(name.trim().to_string());
        } else if line.starts_with("-----BEGIN ") {
            block = Some(format!("{line}\n"));
        } else if let Some(pem) = block.as_mut() {
            pem.push_str(line);
            pem.push('\n');
            if line.starts_with("-----END ") {
                let pem = block.take().unwrap_or_default();
                match &alias {
                    Some(name) => entries.push((name.clone(), pem)),
                    None => debug!("certificate block without alias"),
                }
            }
        }
    }
    entries
}

impl<R: CommandRunner> TrustStore for JavaStore<R> {
    fn id(&self) -> StoreId {
        StoreId::new(StoreKind::Java, self.keystore.display().to_string())
    }

    fn list(&self) -> Result<Vec<CertRecord>> {
        self.require_keystore()?;
        let listing = self.keytool(&["-list", "-rfc"])?;

        let mut certs = Vec::new();
        for (alias, pem) in parse_keytool_rfc(&String::from_utf8_lossy(&listing)) {
            match extract::parse_pem(pem.as_bytes(), &alias) {
                Ok(parsed) => certs.extend(parsed),
                Err(e) => warn!(alias = %alias, error = %e, "skipping unreadable entry"),
            }
        }
        debug!(keystore = %self.keystore.display(), certs = certs.len(), "listed keystore");
        Ok(certs)
    }

    fn backup(&self, staging: &Path) -> Result<()> {
        self.require_keystore()?;
        let dest = staging.join(KEYSTORE_FILE);
        fs::copy(&self.keystore, &dest).map_err(|e| TrustError::io(&self.keystore, e))?;
        Ok(())
    }

    fn remove(&self, removable: &[&CertRecord]) -> Result<()> {
        for cert in removable {
            self.keytool(&["-delete", "-alias", cert.source.as_str()])?;
            info!(alias = %cert.source, fingerprint = %cert.fingerprint, "removed certificate");
        }
        Ok(())
    }

    fn restore(&self, payload: &Path) -> Result<()> {
        let saved = payload.join(KEYSTORE_FILE);
        // keytool rewrites the file a symlink points at, so restore there too.
        let live = fs::canonicalize(&self.keystore).unwrap_or_else(|_| self.keystore.clone());
        fsutil::copy_atomic(&saved, &live)?;
        info!(keystore = %live.display(), "restored keystore");
        Ok(())
    }
}
