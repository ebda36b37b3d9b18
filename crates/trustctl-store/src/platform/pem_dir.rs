//! Flat PEM directory stores (`/etc/ssl/certs` and friends).
//!
//! Every regular file or symlink directly under the root is read as PEM, or
//! as a single DER certificate when it starts like one. Blocks that do not
//! decode are kept byte-for-byte and never hide the rest of their bundle.
//! Hash links such as `5ad8a5d6.0` are ordinary entries here: they carry
//! the same certificate as their target and are removed with it.
//!
//! A symlinked root (`/etc/ssl/certs -> ../pki/tls/certs` on Fedora) is
//! resolved first, so backup and restore act on the real directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use trustctl_core::{extract, CertRecord, Result, TrustError};
use walkdir::WalkDir;

use crate::fsutil;
use crate::platform::{StoreId, StoreKind};
use crate::TrustStore;

/// Known CA directories across Linux and BSD distributions.
pub const CERT_DIRS: &[&str] = &[
    // Debian / Ubuntu / Alpine / Arch
    "/etc/ssl/certs",
    // Fedora / RHEL extracted bundle
    "/etc/pki/ca-trust/extracted/pem",
    // Older RHEL
    "/etc/pki/tls/certs",
    // Arch p11-kit
    "/etc/ca-certificates/extracted",
    // FreeBSD
    "/usr/local/share/certs",
    // NetBSD
    "/etc/openssl/certs",
];

const TREE_DIR: &str = "tree";
const BEGIN: &[u8] = b"-----BEGIN ";
const END: &[u8] = b"-----END ";
const DASHES: &[u8] = b"-----";

/// One block of a file, verbatim, parsed when it is a certificate.
struct Block {
    raw: Vec<u8>,
    cert: Option<CertRecord>,
}

impl Block {
    fn is_doomed(&self, doomed: &HashSet<&str>) -> bool {
        self.cert
            .as_ref()
            .is_some_and(|c| doomed.contains(c.fingerprint.as_str()))
    }
}

/// A file in the store directory and what it holds.
struct Entry {
    path: PathBuf,
    blocks: Vec<Block>,
}

/// Trust store backed by a directory of PEM files.
#[derive(Debug, Clone)]
pub struct PemDirStore {
    root: PathBuf,
}

impl PemDirStore {
    /// Store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// First directory from [`CERT_DIRS`] that exists.
    pub fn detect() -> Result<Self> {
        CERT_DIRS
            .iter()
            .map(Path::new)
            .find(|p| p.is_dir())
            .map(Self::new)
            .ok_or_else(|| {
                TrustError::unavailable(
                    StoreKind::Linux.name(),
                    format!("no CA directory found (looked in {})", CERT_DIRS.join(", ")),
                )
            })
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The real directory behind `root`.
    fn live_root(&self) -> Result<PathBuf> {
        match fs::canonicalize(&self.root) {
            Ok(dir) if dir.is_dir() => Ok(dir),
            _ => Err(TrustError::unavailable(
                StoreKind::Linux.name(),
                format!("{} is not a directory", self.root.display()),
            )),
        }
    }

    fn scan(&self) -> Result<Vec<Entry>> {
        let root = self.live_root()?;

        let mut entries = Vec::new();
        for item in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let item = item.map_err(|e| {
                let path = e.path().unwrap_or(&root).to_path_buf();
                TrustError::io(path, e.into())
            })?;
            if item.file_type().is_dir() {
                continue;
            }

            let path = item.into_path();
            // Follows symlinks; dangling links are skipped.
            let data = match fs::read(&path) {
                Ok(data) => data,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if let Some(entry) = parse_entry(path, &data) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

fn parse_entry(path: PathBuf, data: &[u8]) -> Option<Entry> {
    let source = path.display().to_string();

    let blocks: Vec<Block> = if data.first() == Some(&0x30) {
        match extract::parse_any(data, &source) {
            Ok(certs) => certs
                .into_iter()
                .map(|cert| Block {
                    raw: data.to_vec(),
                    cert: Some(cert),
                })
                .collect(),
            Err(e) => {
                debug!(path = %source, error = %e, "skipping non-certificate file");
                return None;
            }
        }
    } else {
        split_blocks(data)
            .into_iter()
            .map(|raw| parse_block(raw, &source))
            .collect()
    };

    blocks
        .iter()
        .any(|b| b.cert.is_some())
        .then_some(Entry { path, blocks })
}

/// Cut PEM text into `-----BEGIN X-----` .. `-----END X-----` segments.
///
/// A block without its END line runs to the end of the data.
fn split_blocks(data: &[u8]) -> Vec<&[u8]> {
    let mut blocks = Vec::new();
    let mut rest = data;

    while let Some(start) = find(rest, BEGIN) {
        let block = &rest[start..];
        let label = &block[BEGIN.len()..];
        let len = find(label, DASHES)
            .and_then(|n| {
                let marker = [END, &label[..n], DASHES].concat();
                find(block, &marker).map(|i| i + marker.len())
            })
            .unwrap_or(block.len());
        blocks.push(&block[..len]);
        rest = &block[len..];
    }
    blocks
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_block(raw: &[u8], source: &str) -> Block {
    let cert = match pem::parse(raw) {
        Ok(pem) if extract::is_cert_block(&pem) => match extract::parse_der(pem.contents(), source) {
            Ok(cert) => Some(cert),
            Err(e) => {
                warn!(path = %source, error = %e, "certificate does not parse, leaving it alone");
                None
            }
        },
        Ok(_) => None,
        Err(e) => {
            warn!(path = %source, error = %e, "malformed PEM block, leaving it alone");
            None
        }
    };
    Block {
        raw: raw.to_vec(),
        cert,
    }
}

impl TrustStore for PemDirStore {
    fn id(&self) -> StoreId {
        StoreId::new(StoreKind::Linux, self.root.display().to_string())
    }

    fn list(&self) -> Result<Vec<CertRecord>> {
        let mut seen = HashSet::new();
        let mut certs = Vec::new();

        for entry in self.scan()? {
            for cert in entry.blocks.into_iter().filter_map(|b| b.cert) {
                if seen.insert(cert.fingerprint.clone()) {
                    certs.push(cert);
                }
            }
        }

        debug!(root = %self.root.display(), certs = certs.len(), "listed PEM directory");
        Ok(certs)
    }

    fn backup(&self, staging: &Path) -> Result<()> {
        fsutil::mirror_dir(&self.live_root()?, &staging.join(TREE_DIR))
    }

    fn remove(&self, removable: &[&CertRecord]) -> Result<()> {
        let doomed: HashSet<&str> = removable.iter().map(|c| c.fingerprint.as_str()).collect();

        for entry in self.scan()? {
            let (dropped, kept): (Vec<&Block>, Vec<&Block>) =
                entry.blocks.iter().partition(|b| b.is_doomed(&doomed));
            if dropped.is_empty() {
                continue;
            }

            if kept.is_empty() {
                fs::remove_file(&entry.path).map_err(|e| TrustError::io(&entry.path, e))?;
                info!(path = %entry.path.display(), "removed certificate file");
            } else {
                let mut contents = Vec::new();
                for block in &kept {
                    contents.extend_from_slice(&block.raw);
                    contents.push(b'\n');
                }
                fsutil::write_atomic(&entry.path, &contents)?;
                info!(
                    path = %entry.path.display(),
                    removed = dropped.len(),
                    kept = kept.len(),
                    "rewrote certificate bundle"
                );
            }
        }
        Ok(())
    }

    fn restore(&self, payload: &Path) -> Result<()> {
        let tree = payload.join(TREE_DIR);
        if !tree.is_dir() {
            return Err(TrustError::io(
                &tree,
                std::io::Error::new(std::io::ErrorKind::NotFound, "backup payload has no tree"),
            ));
        }
        // A root that no longer exists is recreated where it was.
        let live = fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        fsutil::replace_dir(&live, &tree)
    }
}
