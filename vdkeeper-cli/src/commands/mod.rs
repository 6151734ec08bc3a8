pub mod check;
pub mod reload;
pub mod start;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};

pub fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    match flag {
        Some(dir) => Ok(dir),
        None => vdkeeper_core::config::default_data_dir()
            .context("could not determine the vdkeeper data directory; pass --data-dir"),
    }
}
