use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for trust store operations
pub type Result<T> = std::result::Result<T, TrustError>;

/// Errors that can occur while loading whitelists or touching a trust store
#[derive(Error, Debug)]
pub enum TrustError {
    /// Whitelist path is empty or looks like a command-line flag
    #[error("invalid whitelist path '{path}': {reason}")]
    InvalidPath {
        /// The offending path as given
        path: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Whitelist file does not exist
    #[error("whitelist not found: {}", path.display())]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Whitelist contents could not be decoded
    #[error("failed to parse {}: {reason}", path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// Certificate bytes could not be decoded
    #[error("failed to parse certificate from {source_name}: {reason}")]
    CertParse {
        /// Where the bytes came from (file, alias, nickname)
        source_name: String,
        /// Parser message
        reason: String,
    },

    /// Platform tool, directory or API is missing or inaccessible
    #[error("{store} trust store unavailable: {reason}")]
    StoreUnavailable {
        /// Store kind
        store: String,
        /// What is missing
        reason: String,
    },

    /// Remove attempted without a backup in this session
    #[error("refusing to modify {store} trust store: no backup taken in this session")]
    NoBackup {
        /// Store identity
        store: String,
    },

    /// Restore requested but nothing has been backed up
    #[error("no backup found for {store} trust store at {}", location.display())]
    NoBackupFound {
        /// Store identity
        store: String,
        /// Where the backup was expected
        location: PathBuf,
    },

    /// Best-effort restore could not re-add every certificate
    #[error("partial restore of {store} trust store: {} certificate(s) failed: {}", failed.len(), failed.join(", "))]
    PartialRestore {
        /// Store identity
        store: String,
        /// Entries the platform refused, with reasons
        failed: Vec<String>,
    },

    /// A store entry cannot be changed without touching certificates outside the request
    #[error("{store} trust store: cannot remove '{entry}': {reason}")]
    AmbiguousEntry {
        /// Store identity
        store: String,
        /// Nickname or alias shared by several certificates
        entry: String,
        /// What else the entry holds
        reason: String,
    },

    /// Filesystem failure
    #[error("io error at {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Platform tool ran but reported failure
    #[error("{program} failed (exit {}): {stderr}", status.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    Command {
        /// Tool name
        program: String,
        /// Exit status, `None` when killed by a signal
        status: Option<i32>,
        /// Trimmed stderr
        stderr: String,
    },

    /// JSON encoding of a manifest or report
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrustError {
    /// Wrap an IO error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Shorthand for [`TrustError::StoreUnavailable`].
    pub fn unavailable(store: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            store: store.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code for this error's category.
    ///
    /// `2` is left to the argument parser and `1` to failures outside
    /// this taxonomy.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidPath { .. } => 3,
            Self::NotFound { .. } => 4,
            Self::Parse { .. } | Self::CertParse { .. } => 5,
            Self::StoreUnavailable { .. } => 6,
            Self::NoBackup { .. } => 7,
            Self::NoBackupFound { .. } => 8,
            Self::PartialRestore { .. } => 9,
            Self::AmbiguousEntry { .. } | Self::Io { .. } | Self::Command { .. } | Self::Json(_) => {
                10
            }
        }
    }

    /// Short category label used in user-facing messages.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::InvalidPath { .. } => "invalid path",
            Self::NotFound { .. } => "not found",
            Self::Parse { .. } | Self::CertParse { .. } => "parse error",
            Self::StoreUnavailable { .. } => "store unavailable",
            Self::NoBackup { .. } => "no backup",
            Self::NoBackupFound { .. } => "no backup found",
            Self::PartialRestore { .. } => "partial restore",
            Self::AmbiguousEntry { .. } => "ambiguous entry",
            Self::Io { .. } | Self::Command { .. } | Self::Json(_) => "io error",
        }
    }
}
