//! NSS shared certificate databases (`~/.pki/nssdb`, Firefox profiles).
//!
//! Certificates are listed and deleted with NSS `certutil`, addressed by
//! nickname. Backup copies the database files themselves, so restore is
//! exact.
//!
//! `certutil -D -n <nickname>` deletes one certificate under that nickname
//! without saying which. A nickname is only deleted from when every
//! certificate it holds is being removed, and then until it is empty.

use directories::BaseDirs;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use trustctl_core::{extract, CertRecord, Result, TrustError};

use crate::fsutil;
use crate::platform::{StoreId, StoreKind};
use crate::runner::{invoke, run_tool, CommandRunner};
use crate::TrustStore;

const CERTUTIL: &str = "certutil";
const DB_DIR: &str = "db";

/// Files making up an NSS database, SQLite (`cert9`) and legacy DBM (`cert8`).
pub const DB_FILES: &[&str] = &[
    "cert9.db",
    "key4.db",
    "pkcs11.txt",
    "cert8.db",
    "key3.db",
    "secmod.db",
];

/// Trust store backed by an NSS database directory.
#[derive(Debug, Clone)]
pub struct NssStore<R> {
    db_dir: PathBuf,
    runner: R,
}

impl<R: CommandRunner> NssStore<R> {
    /// Database in `db_dir`.
    pub fn new(db_dir: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            db_dir: db_dir.into(),
            runner,
        }
    }

    /// The user's shared database, `~/.pki/nssdb`.
    pub fn detect(runner: R) -> Result<Self> {
        let dirs = BaseDirs::new().ok_or_else(|| {
            TrustError::unavailable(StoreKind::Nss.name(), "cannot determine home directory")
        })?;
        let db_dir = dirs.home_dir().join(".pki").join("nssdb");
        if !db_dir.is_dir() {
            return Err(TrustError::unavailable(
                StoreKind::Nss.name(),
                format!("no NSS database at {}", db_dir.display()),
            ));
        }
        Ok(Self::new(db_dir, runner))
    }

    /// `-d` argument: `sql:` prefixed for SQLite databases.
    fn db_arg(&self) -> String {
        if self.db_dir.join("cert9.db").exists() {
            format!("sql:{}", self.db_dir.display())
        } else {
            self.db_dir.display().to_string()
        }
    }

    /// Distinct nicknames in the database, in listing order.
    fn nicknames(&self, db: &str) -> Result<Vec<String>> {
        let listing = run_tool(&self.runner, StoreKind::Nss, CERTUTIL, &["-L", "-d", db])?;
        let mut seen = HashSet::new();
        let mut nicknames = parse_nicknames(&String::from_utf8_lossy(&listing));
        nicknames.retain(|n| seen.insert(n.clone()));
        Ok(nicknames)
    }

    /// PEM of every certificate under `nickname`; empty once it is gone.
    fn export_nickname(&self, db: &str, nickname: &str) -> Result<Vec<u8>> {
        let output = invoke(
            &self.runner,
            StoreKind::Nss,
            CERTUTIL,
            &["-L", "-d", db, "-n", nickname, "-a"],
        )?;
        if output.success() {
            return Ok(output.stdout);
        }
        let stderr = output.stderr_text();
        if stderr.to_ascii_lowercase().contains("could not find cert") {
            return Ok(Vec::new());
        }
        Err(TrustError::Command {
            program: CERTUTIL.to_string(),
            status: output.status,
            stderr,
        })
    }

    fn present_files(&self) -> Vec<&'static str> {
        DB_FILES
            .iter()
            .copied()
            .filter(|f| self.db_dir.join(f).is_file())
            .collect()
    }
}

/// Nicknames from `certutil -L` output.
///
/// Each row is the nickname padded with spaces, then the trust flags
/// (`C,,`, `CT,C,C`, `u,u,u`).
fn parse_nicknames(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .filter(|l| !l.starts_with("Certificate Nickname"))
        .filter(|l| l.trim() != "SSL,S/MIME,JAR/XPI")
        .filter_map(|l| {
            let (nick, flags) = l.rsplit_once(char::is_whitespace)?;
            (flags.matches(',').count() == 2).then(|| nick.trim().to_string())
        })
        .filter(|nick| !nick.is_empty())
        .collect()
}

impl<R: CommandRunner> TrustStore for NssStore<R> {
    fn id(&self) -> StoreId {
        StoreId::new(StoreKind::Nss, self.db_dir.display().to_string())
    }

    fn list(&self) -> Result<Vec<CertRecord>> {
        if !self.db_dir.is_dir() {
            return Err(TrustError::unavailable(
                StoreKind::Nss.name(),
                format!("{} is not a directory", self.db_dir.display()),
            ));
        }

        let db = self.db_arg();
        let mut seen = HashSet::new();
        let mut certs = Vec::new();
        for nick in self.nicknames(&db)? {
            let pem = self.export_nickname(&db, &nick)?;
            match extract::parse_pem(&pem, &nick) {
                Ok(parsed) => certs.extend(parsed.into_iter().filter(|c| seen.insert(c.fingerprint.clone()))),
                Err(e) => warn!(nickname = %nick, error = %e, "skipping unreadable entry"),
            }
        }

        debug!(db = %self.db_dir.display(), certs = certs.len(), "listed NSS database");
        Ok(certs)
    }

    fn backup(&self, staging: &Path) -> Result<()> {
        let files = self.present_files();
        if files.is_empty() {
            return Err(TrustError::unavailable(
                StoreKind::Nss.name(),
                format!("no database files in {}", self.db_dir.display()),
            ));
        }

        let dest = staging.join(DB_DIR);
        fs::create_dir_all(&dest).map_err(|e| TrustError::io(&dest, e))?;
        for file in files {
            let from = self.db_dir.join(file);
            let to = dest.join(file);
            fs::copy(&from, &to).map_err(|e| TrustError::io(&from, e))?;
        }
        Ok(())
    }

    fn remove(&self, removable: &[&CertRecord]) -> Result<()> {
        let db = self.db_arg();
        let doomed: HashSet<&str> = removable.iter().map(|c| c.fingerprint.as_str()).collect();

        // Check every nickname before deleting anything.
        let mut deletions = Vec::new();
        for nick in self.nicknames(&db)? {
            let pem = self.export_nickname(&db, &nick)?;
            let held = String::from_utf8_lossy(&pem)
                .matches("-----BEGIN CERTIFICATE-----")
                .count();
            let certs = extract::parse_pem(&pem, &nick).unwrap_or_default();
            if !certs.iter().any(|c| doomed.contains(c.fingerprint.as_str())) {
                continue;
            }

            if let Some(kept) = certs.iter().find(|c| !doomed.contains(c.fingerprint.as_str())) {
                return Err(TrustError::AmbiguousEntry {
                    store: self.id().to_string(),
                    entry: nick,
                    reason: format!(
                        "it also holds {} ({}), which is kept",
                        kept.display_name(),
                        kept.fingerprint
                    ),
                });
            }
            if certs.len() < held {
                return Err(TrustError::AmbiguousEntry {
                    store: self.id().to_string(),
                    entry: nick,
                    reason: format!("{} of its {held} certificates do not parse", held - certs.len()),
                });
            }
            deletions.push((nick, held));
        }

        for (nick, held) in deletions {
            for _ in 0..held {
                run_tool(
                    &self.runner,
                    StoreKind::Nss,
                    CERTUTIL,
                    &["-D", "-d", db.as_str(), "-n", nick.as_str()],
                )?;
            }
            if !self.export_nickname(&db, &nick)?.is_empty() {
                return Err(TrustError::AmbiguousEntry {
                    store: self.id().to_string(),
                    entry: nick,
                    reason: format!("certificates remain after {held} deletions"),
                });
            }
            info!(nickname = %nick, removed = held, "removed certificates");
        }
        Ok(())
    }

    fn restore(&self, payload: &Path) -> Result<()> {
        let saved = payload.join(DB_DIR);
        if !saved.is_dir() {
            return Err(TrustError::io(
                &saved,
                std::io::Error::new(std::io::ErrorKind::NotFound, "backup payload has no database"),
            ));
        }

        for file in DB_FILES {
            let from = saved.join(file);
            let live = self.db_dir.join(file);
            if from.is_file() {
                fsutil::copy_atomic(&from, &live)?;
            } else if live.is_file() {
                fs::remove_file(&live).map_err(|e| TrustError::io(&live, e))?;
                debug!(file = %live.display(), "removed file absent from backup");
            }
        }
        info!(db = %self.db_dir.display(), "restored NSS database files");
        Ok(())
    }
}
