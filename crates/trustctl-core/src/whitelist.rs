//! Whitelist file loading.
//!
//! Files are JSON unless the extension says YAML:
//!
//! ```json
//! {
//!   "Signatures": { "Hex": ["96940d99", "..."] },
//!   "Issuers": { "CommonName": ["Starfield"] }
//! }
//! ```
//!
//! Lowercase keys (`signatures`, `hex`, `issuers`, `commonName`) are
//! accepted too. Unknown keys are ignored; `null` reads as empty.
//!
//! A signature that is not hex fails the whole load. Overlapping entries
//! are kept as written.

use serde::{Deserialize, Deserializer};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Result, TrustError};
use crate::hash::normalize_hex;
use crate::types::{Whitelist, WhitelistItem};

/// Signatures shorter than this are accepted but likely to over-match.
pub const SHORT_SIGNATURE_LEN: usize = 8;

#[derive(Debug, Default, Deserialize)]
struct WhitelistFile {
    #[serde(
        rename = "Signatures",
        alias = "signatures",
        default,
        deserialize_with = "null_as_default"
    )]
    signatures: SignatureSection,
    #[serde(
        rename = "Issuers",
        alias = "issuers",
        default,
        deserialize_with = "null_as_default"
    )]
    issuers: IssuerSection,
}

#[derive(Debug, Default, Deserialize)]
struct SignatureSection {
    #[serde(rename = "Hex", alias = "hex", default, deserialize_with = "null_as_default")]
    hex: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IssuerSection {
    #[serde(
        rename = "CommonName",
        alias = "commonName",
        alias = "commonname",
        alias = "common_name",
        default,
        deserialize_with = "null_as_default"
    )]
    common_name: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Whitelist {
    /// Load a whitelist file.
    ///
    /// # Errors
    ///
    /// - [`TrustError::InvalidPath`] for an empty path or one starting with `-`
    /// - [`TrustError::NotFound`] when the file does not exist
    /// - [`TrustError::Parse`] when the contents do not fit the schema or a
    ///   signature is not hex
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        validate_path(path)?;

        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TrustError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                TrustError::io(path, e)
            }
        })?;

        let whitelist = if is_yaml(path) {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
        .map_err(|reason| TrustError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;

        if whitelist.is_empty() {
            warn!(path = %path.display(), "whitelist is empty, every certificate will be removable");
        }
        debug!(path = %path.display(), items = whitelist.len(), "loaded whitelist");
        Ok(whitelist)
    }

    /// Decode JSON whitelist contents.
    pub fn from_json(content: &str) -> std::result::Result<Self, String> {
        let file: WhitelistFile = serde_json::from_str(content).map_err(|e| e.to_string())?;
        file.into_whitelist()
    }

    /// Decode YAML whitelist contents.
    pub fn from_yaml(content: &str) -> std::result::Result<Self, String> {
        // serde_yaml rejects an empty document; treat it like `{}`.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: WhitelistFile = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        file.into_whitelist()
    }
}

impl WhitelistFile {
    fn into_whitelist(self) -> std::result::Result<Whitelist, String> {
        let mut items = Vec::with_capacity(self.signatures.hex.len() + self.issuers.common_name.len());

        for raw in self.signatures.hex {
            let signature =
                normalize_hex(&raw).ok_or_else(|| format!("signature '{raw}' is not hex"))?;
            if signature.len() < SHORT_SIGNATURE_LEN {
                warn!(signature = %raw, "short fingerprint signature may match many certificates");
            }
            items.push(WhitelistItem::Fingerprint { signature });
        }

        for name in self.issuers.common_name {
            if name.is_empty() {
                warn!("empty issuer name never matches");
            }
            items.push(WhitelistItem::IssuerCommonName { name });
        }

        Ok(Whitelist::new(items))
    }
}

fn validate_path(path: &Path) -> Result<()> {
    let raw = path.to_string_lossy();
    if raw.trim().is_empty() {
        return Err(TrustError::InvalidPath {
            path: raw.into_owned(),
            reason: "the whitelist file path is empty",
        });
    }
    if raw.starts_with('-') {
        return Err(TrustError::InvalidPath {
            path: raw.into_owned(),
            reason: "the path looks like a command-line flag, --file needs a path to the whitelist",
        });
    }
    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}
