//! # trustctl-core
//!
//! Certificate records, whitelist matching and removal resolution.
//!
//! - **Extraction**: raw PEM/DER from a trust store into [`CertRecord`]s
//! - **Whitelists**: [`WhitelistItem`] matchers loaded from JSON or YAML
//! - **Resolution**: [`find_removable`] decides which certificates go
//! - **Errors**: one taxonomy, [`TrustError`], shared by every store
//!
//! # Example
//!
//! ```rust,ignore
//! use trustctl_core::{extract, find_removable, Whitelist};
//!
//! let snapshot = extract::parse_pem(&std::fs::read("ca-bundle.pem")?, "ca-bundle.pem")?;
//! let whitelist = Whitelist::load("whitelist.json")?;
//! for cert in find_removable(&snapshot, &whitelist) {
//!     println!("would remove {}", cert.display_name());
//! }
//! ```

mod error;
pub mod extract;
pub mod hash;
pub mod resolver;
pub mod types;
pub mod whitelist;

pub use error::{Result, TrustError};
pub use resolver::{find_removable, RemovalPlan};
pub use types::*;
