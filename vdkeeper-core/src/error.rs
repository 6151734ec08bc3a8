//! Error types for vdkeeper-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from reading or writing the desired-state file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, unreadable file, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (save path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parse error on load, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Parsed, but an entry breaks a document-wide rule.
    #[error("invalid config at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// `dirs::data_dir()` returned `None`.
    #[error("cannot determine the user data directory; pass --data-dir")]
    DataDirNotFound,
}
