//! `vdkeeper start`: run the daemon in the foreground.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use vdkeeper_daemon::{start_blocking, DaemonOptions, LogFormat};

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Config file to reconcile against (default: <data-dir>/virtual-displays.json).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long)]
    pub log_json: bool,
}

impl StartArgs {
    pub fn run(self, data_dir: &Path) -> Result<()> {
        let mut options = DaemonOptions::for_data_dir(data_dir);
        if let Some(config) = self.config {
            options = options.with_config_path(config);
        }
        let format = if self.log_json {
            LogFormat::Json
        } else {
            LogFormat::Text
        };
        start_blocking(options, format).context("daemon exited with an error")
    }
}
