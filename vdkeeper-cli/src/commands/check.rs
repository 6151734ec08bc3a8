//! `vdkeeper check`: strict validation of the config file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use vdkeeper_core::{ConfigStore, DisplaySpec};
use vdkeeper_daemon::paths::config_path;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Config file to check (default: <data-dir>/virtual-displays.json).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Tabled)]
struct DisplayRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "resolution")]
    resolution: String,
    #[tabled(rename = "refresh")]
    refresh: String,
    #[tabled(rename = "hiDPI")]
    hidpi: bool,
    #[tabled(rename = "on startup")]
    on_startup: bool,
}

impl From<&DisplaySpec> for DisplayRow {
    fn from(spec: &DisplaySpec) -> Self {
        Self {
            name: spec.name.to_string(),
            resolution: spec.resolution().to_string(),
            refresh: format!("{} Hz", spec.refresh_rate),
            hidpi: spec.hidpi,
            on_startup: spec.connect_on_startup,
        }
    }
}

impl CheckArgs {
    pub fn run(self, data_dir: &Path) -> Result<()> {
        let path = self.config.unwrap_or_else(|| config_path(data_dir));
        let specs = ConfigStore::new(&path)
            .read()
            .with_context(|| format!("config file {} is not usable", path.display()))?;

        if specs.is_empty() {
            println!("{} {} declares no displays", "✓".green(), path.display());
            return Ok(());
        }

        let mut table = Table::new(specs.iter().map(DisplayRow::from));
        table.with(Style::rounded());
        println!("{table}");

        let on_startup = specs.iter().filter(|s| s.connect_on_startup).count();
        println!(
            "{} {} is valid: {} displays, {} created on startup",
            "✓".green(),
            path.display(),
            specs.len(),
            on_startup,
        );
        Ok(())
    }
}
