use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths::{
    config_path, pid_path, CORRECTION_DELAY, CREATE_RETRY_DELAY, REAPPEAR_INTERVAL,
    RESOLVE_ATTEMPTS, RESOLVE_INTERVAL, SETTLE_DELAY,
};
use crate::retry::RetryPolicy;

/// Every delay the daemon schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub create_retry: Duration,
    pub settle: Duration,
    pub correction: Duration,
    pub resolve: RetryPolicy,
    pub reappear: RetryPolicy,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            create_retry: CREATE_RETRY_DELAY,
            settle: SETTLE_DELAY,
            correction: CORRECTION_DELAY,
            resolve: RetryPolicy::bounded(RESOLVE_ATTEMPTS, RESOLVE_INTERVAL),
            reappear: RetryPolicy::unbounded(REAPPEAR_INTERVAL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonOptions {
    pub config_path: PathBuf,
    pub pid_path: PathBuf,
    pub timings: Timings,
}

impl DaemonOptions {
    /// Standard file names under `data_dir`, default timings.
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Self {
            config_path: config_path(data_dir),
            pid_path: pid_path(data_dir),
            timings: Timings::default(),
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }
}
