//! vdkeeper daemon: keeps the virtual displays listed in the config file alive
//! and pinned to their configured resolution.

mod error;
pub mod event;
pub mod guard;
pub mod headless;
pub mod options;
pub mod paths;
pub mod pidfile;
pub mod platform;
pub mod reconciler;
pub mod registry;
pub mod retry;
mod runtime;
pub mod signal;
pub mod watcher;

pub use error::{DaemonError, PlatformError};
pub use event::{Event, Trigger};
pub use headless::{HeadlessPlatform, PlatformOp};
pub use options::{DaemonOptions, Timings};
pub use platform::DisplayPlatform;
pub use reconciler::{ReconcileReport, Reconciler};
pub use runtime::{serve, start_blocking, Daemon, Flow, LogFormat};
pub use signal::send_reload;
