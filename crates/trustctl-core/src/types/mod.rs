//! Core types for trust store remediation.

pub mod cert;
pub mod whitelist;

pub use cert::{CertRecord, Fingerprint};
pub use whitelist::{Whitelist, WhitelistItem};
