//! `vdkeeper status`: daemon liveness and config summary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use vdkeeper_core::{ConfigError, ConfigStore};
use vdkeeper_daemon::paths::{config_path, pid_path};
use vdkeeper_daemon::pidfile;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Config file the daemon was started with (default: <data-dir>/virtual-displays.json).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum ConfigState {
    Ok,
    Missing,
    Invalid,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    running: bool,
    pid: Option<i32>,
    pid_file: String,
    config: String,
    config_state: ConfigState,
    declared: usize,
    on_startup: usize,
    problems: Vec<String>,
}

impl StatusArgs {
    pub fn run(self, data_dir: &Path) -> Result<()> {
        let config = self.config.unwrap_or_else(|| config_path(data_dir));
        let report = build_report(data_dir, &config);
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_human(&report);
        Ok(())
    }
}

fn build_report(data_dir: &Path, config: &Path) -> StatusReport {
    let pid_file = pid_path(data_dir);
    let mut problems = Vec::new();

    let pid = match pidfile::running_pid(&pid_file) {
        Ok(pid) => pid,
        Err(err) => {
            problems.push(err.to_string());
            None
        }
    };

    let (config_state, declared, on_startup) = match ConfigStore::new(config).read() {
        Ok(specs) => {
            let on_startup = specs.iter().filter(|s| s.connect_on_startup).count();
            (ConfigState::Ok, specs.len(), on_startup)
        }
        Err(ConfigError::NotFound { .. }) => (ConfigState::Missing, 0, 0),
        Err(err) => {
            problems.push(err.to_string());
            (ConfigState::Invalid, 0, 0)
        }
    };

    StatusReport {
        running: pid.is_some(),
        pid,
        pid_file: pid_file.display().to_string(),
        config: config.display().to_string(),
        config_state,
        declared,
        on_startup,
        problems,
    }
}

fn print_human(report: &StatusReport) {
    println!("vdkeeper v{}", env!("CARGO_PKG_VERSION"));

    let daemon = match report.pid {
        Some(pid) => format!("running (pid {pid})").green(),
        None => "not running".yellow(),
    };
    println!("  daemon:   {daemon}");

    let config = match report.config_state {
        ConfigState::Ok => format!(
            "{} displays declared, {} on startup",
            report.declared, report.on_startup
        )
        .normal(),
        ConfigState::Missing => "missing".yellow(),
        ConfigState::Invalid => "invalid".red().bold(),
    };
    println!("  config:   {} ({config})", report.config);
    println!("  pid file: {}", report.pid_file);

    for problem in &report.problems {
        println!("  {} {problem}", "!".red());
    }
}
