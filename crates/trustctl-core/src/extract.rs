//! Certificate extraction: raw store output into [`CertRecord`]s.

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;
use x509_parser::x509::X509Name;

use crate::error::{Result, TrustError};
use crate::hash::{sha1_hex, sha256_hex};
use crate::types::CertRecord;

/// PEM tags that carry a certificate.
const CERT_TAGS: &[&str] = &["CERTIFICATE", "TRUSTED CERTIFICATE", "X509 CERTIFICATE"];

/// Parse a single DER-encoded X.509 certificate.
///
/// Trailing bytes after the certificate (OpenSSL trust auxiliary data)
/// are ignored and excluded from the fingerprint.
pub fn parse_der(der: &[u8], source: &str) -> Result<CertRecord> {
    let (rest, cert) =
        x509_parser::parse_x509_certificate(der).map_err(|e| TrustError::CertParse {
            source_name: source.to_string(),
            reason: e.to_string(),
        })?;
    let der = &der[..der.len() - rest.len()];

    Ok(CertRecord {
        source: source.to_string(),
        fingerprint: sha256_hex(der),
        sha1: sha1_hex(der),
        issuer_cn: common_name(cert.issuer()),
        subject_cn: common_name(cert.subject()),
        subject: cert.subject().to_string(),
        serial: cert.raw_serial_as_string(),
        not_after: asn1_to_utc(cert.validity().not_after),
        der: der.to_vec(),
    })
}

/// Parse every certificate in PEM text.
///
/// Blocks with other tags are ignored. Blocks that fail X.509 parsing are
/// logged and skipped; only broken PEM framing fails the whole input.
pub fn parse_pem(data: &[u8], source: &str) -> Result<Vec<CertRecord>> {
    let blocks = pem::parse_many(data).map_err(|e| TrustError::CertParse {
        source_name: source.to_string(),
        reason: e.to_string(),
    })?;

    let mut certs = Vec::new();
    for block in blocks.iter().filter(|b| is_cert_block(b)) {
        match parse_der(block.contents(), source) {
            Ok(cert) => certs.push(cert),
            Err(e) => debug!(source, error = %e, "skipping unparseable certificate"),
        }
    }
    Ok(certs)
}

/// Parse either PEM or bare DER, sniffing the first bytes.
pub fn parse_any(data: &[u8], source: &str) -> Result<Vec<CertRecord>> {
    if data.first() == Some(&0x30) {
        parse_der(data, source).map(|c| vec![c])
    } else {
        parse_pem(data, source)
    }
}

/// True for PEM blocks holding a certificate.
#[must_use]
pub fn is_cert_block(block: &pem::Pem) -> bool {
    CERT_TAGS.contains(&block.tag())
}

/// First common name in a distinguished name, or empty.
fn common_name(name: &X509Name<'_>) -> String {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`.
fn asn1_to_utc(t: x509_parser::time::ASN1Time) -> DateTime<Utc> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
