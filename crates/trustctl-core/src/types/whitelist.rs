//! Whitelist item types.

use serde::{Deserialize, Serialize};

use super::cert::CertRecord;

/// A single allow-list entry.
///
/// A certificate matched by any item is kept in the trust store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WhitelistItem {
    /// Prefix of the SHA-256 fingerprint, any case
    Fingerprint {
        /// Hex signature, possibly truncated
        signature: String,
    },
    /// Case-sensitive substring of the issuer common name
    IssuerCommonName {
        /// Text to look for
        name: String,
    },
}

impl WhitelistItem {
    /// Fingerprint item from a hex signature.
    pub fn fingerprint(signature: impl Into<String>) -> Self {
        Self::Fingerprint {
            signature: signature.into(),
        }
    }

    /// Issuer common-name item.
    pub fn issuer_common_name(name: impl Into<String>) -> Self {
        Self::IssuerCommonName { name: name.into() }
    }

    /// Does this item allow `cert`? Empty signatures and names never match.
    #[must_use]
    pub fn matches(&self, cert: &CertRecord) -> bool {
        match self {
            Self::Fingerprint { signature } => {
                !signature.is_empty()
                    && cert
                        .fingerprint
                        .to_ascii_lowercase()
                        .starts_with(&signature.to_ascii_lowercase())
            }
            Self::IssuerCommonName { name } => {
                !name.is_empty() && cert.issuer_cn.contains(name.as_str())
            }
        }
    }
}

/// Ordered allow-list, immutable for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Whitelist {
    items: Vec<WhitelistItem>,
}

impl Whitelist {
    /// Build a whitelist from items, in order.
    #[must_use]
    pub const fn new(items: Vec<WhitelistItem>) -> Self {
        Self { items }
    }

    /// Items in load order.
    #[must_use]
    pub fn items(&self) -> &[WhitelistItem] {
        &self.items
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when there are no items (every certificate is removable).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True if any item matches `cert`.
    #[must_use]
    pub fn allows(&self, cert: &CertRecord) -> bool {
        self.items.iter().any(|item| item.matches(cert))
    }
}

impl FromIterator<WhitelistItem> for Whitelist {
    fn from_iter<I: IntoIterator<Item = WhitelistItem>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
