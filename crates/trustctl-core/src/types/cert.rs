//! Certificate record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SHA-256 fingerprint of a certificate's DER encoding (lowercase hex).
pub type Fingerprint = String;

/// One certificate as found in a platform trust store.
///
/// Built by [`crate::extract`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertRecord {
    /// Store-local identity of the entry (file path, alias, nickname, keychain)
    pub source: String,
    /// SHA-256 fingerprint of DER bytes (hex)
    pub fingerprint: Fingerprint,
    /// SHA-1 thumbprint of DER bytes (hex)
    pub sha1: String,
    /// Issuer common name, empty when the issuer has none
    pub issuer_cn: String,
    /// Subject common name, empty when the subject has none
    pub subject_cn: String,
    /// Subject distinguished name (human-readable)
    pub subject: String,
    /// Serial number (hex)
    pub serial: String,
    /// Not valid after
    pub not_after: DateTime<Utc>,
    /// Raw DER encoding
    #[serde(skip)]
    pub der: Vec<u8>,
}

impl CertRecord {
    /// PEM encoding of the certificate, LF line endings.
    #[must_use]
    pub fn to_pem(&self) -> String {
        let config = pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF);
        pem::encode_config(&pem::Pem::new("CERTIFICATE", self.der.clone()), config)
    }

    /// Display name: subject CN, falling back to the full subject.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.subject_cn.is_empty() {
            &self.subject
        } else {
            &self.subject_cn
        }
    }
}
