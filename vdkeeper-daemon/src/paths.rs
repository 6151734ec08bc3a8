use std::path::{Path, PathBuf};
use std::time::Duration;

pub use vdkeeper_core::config::config_path;

pub const PID_FILE: &str = "daemon.pid";

/// Delay before retrying a pass in which some creation failed.
pub const CREATE_RETRY_DELAY: Duration = Duration::from_secs(30);
/// Quiet period after a config file event before reconciling.
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);
/// Delay between a drift notification and the corrective mode change.
pub const CORRECTION_DELAY: Duration = Duration::from_millis(500);
pub const RESOLVE_ATTEMPTS: u32 = 5;
pub const RESOLVE_INTERVAL: Duration = Duration::from_secs(1);
/// Poll interval while the config path does not exist.
pub const REAPPEAR_INTERVAL: Duration = Duration::from_secs(2);

pub fn pid_path(data_dir: &Path) -> PathBuf {
    data_dir.join(PID_FILE)
}
