//! vdkeeper: keep declared virtual displays alive and at their configured size.
//!
//! # Usage
//!
//! ```text
//! vdkeeper [--data-dir <dir>] start [--config <file>] [--log-json]
//! vdkeeper [--data-dir <dir>] reload
//! vdkeeper [--data-dir <dir>] status [--json]
//! vdkeeper [--data-dir <dir>] check [--config <file>]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, start::StartArgs, status::StatusArgs};

#[derive(Parser, Debug)]
#[command(
    name = "vdkeeper",
    version,
    about = "Reconcile virtual displays against a declarative config file",
    long_about = None,
)]
struct Cli {
    /// Directory holding the config file and the pid marker.
    #[arg(long, global = true, env = "VDKEEPER_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the daemon in the foreground until SIGINT or SIGTERM.
    Start(StartArgs),

    /// Ask the running daemon to reconcile now (SIGUSR1).
    Reload,

    /// Report whether the daemon is running and what it is configured with.
    Status(StatusArgs),

    /// Validate the config file and list the displays it declares.
    Check(CheckArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = commands::resolve_data_dir(cli.data_dir)?;
    match cli.command {
        Commands::Start(args) => args.run(&data_dir),
        Commands::Reload => commands::reload::run(&data_dir),
        Commands::Status(args) => args.run(&data_dir),
        Commands::Check(args) => args.run(&data_dir),
    }
}
