//! Certificate fingerprints via `ring::digest`.

use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY, SHA256};

/// SHA-256 of raw bytes, lowercase hex without separators.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(digest(&SHA256, data).as_ref())
}

/// SHA-1 of raw bytes, lowercase hex.
///
/// Only used to address entries in platform tools that key certificates
/// by SHA-1 thumbprint.
#[must_use]
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(digest(&SHA1_FOR_LEGACY_USE_ONLY, data).as_ref())
}

/// Normalize a user-supplied fingerprint: strip `:` separators and
/// surrounding whitespace, lowercase the rest.
///
/// Returns `None` if anything other than hex digits remains.
#[must_use]
pub fn normalize_hex(input: &str) -> Option<String> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != ':')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    cleaned
        .chars()
        .all(|c| c.is_ascii_hexdigit())
        .then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha1_hex() {
        assert_eq!(
            sha1_hex(b"hello world"),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
    }

    #[test]
    fn normalize_strips_colons_and_case() {
        assert_eq!(normalize_hex("AA:bb:0C").as_deref(), Some("aabb0c"));
        assert_eq!(normalize_hex("  96940D99 ").as_deref(), Some("96940d99"));
        assert_eq!(normalize_hex("").as_deref(), Some(""));
        assert_eq!(normalize_hex("xyz"), None);
        assert_eq!(normalize_hex("aa bb"), None);
    }
}
