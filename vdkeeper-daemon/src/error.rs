use std::path::PathBuf;

use thiserror::Error;

/// Error surface for daemon startup, PID marker handling and trigger delivery.
///
/// Nothing in the steady-state loop returns this; per-display failures are
/// logged where they happen.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("malformed pid marker at {path}: {contents:?}")]
    BadPidMarker { path: PathBuf, contents: String },

    #[error("daemon is not running (pid marker: {pid_file})")]
    DaemonNotRunning { pid_file: PathBuf },

    #[error("signal delivery failed: {0}")]
    Signal(#[from] nix::Error),
}

/// Platform capability failures, scoped to a single display or output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// Every virtual display slot is held (possibly by another process).
    #[error("no virtual display slot available for '{0}'")]
    SlotUnavailable(String),

    #[error("platform rejected display '{name}': {reason}")]
    Rejected { name: String, reason: String },

    #[error("output {0} is unknown to the platform")]
    UnknownOutput(u32),

    #[error("display configuration transaction failed on output {output}: {reason}")]
    Transaction { output: u32, reason: String },

    #[error("reconfiguration notifications are unavailable: {0}")]
    SubscriptionUnavailable(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
