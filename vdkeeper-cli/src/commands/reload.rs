//! `vdkeeper reload`

use std::path::Path;

use anyhow::{Context, Result};

use vdkeeper_daemon::{paths::pid_path, send_reload};

pub fn run(data_dir: &Path) -> Result<()> {
    let pid_file = pid_path(data_dir);
    let pid = send_reload(&pid_file).context("failed to trigger a reconcile")?;
    println!("reconcile requested (pid {pid})");
    Ok(())
}
