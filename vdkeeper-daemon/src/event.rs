use std::fmt;

use vdkeeper_core::{DisplayName, OutputId, Reconfiguration};

use crate::watcher::FileChange;

/// Why a reconcile pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    /// SIGUSR1 from the controlling application.
    Signal,
    /// The config file settled after a change, or reappeared.
    ConfigFile,
    /// Debounced retry after a failed creation.
    Retry,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Startup => write!(f, "startup"),
            Trigger::Signal => write!(f, "signal"),
            Trigger::ConfigFile => write!(f, "config-file"),
            Trigger::Retry => write!(f, "retry"),
        }
    }
}

/// Everything the event loop processes, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Reconcile(Trigger),
    ConfigChanged(FileChange),
    ConfigSettled,
    /// (Re-)establish the config watch; `attempt` counts misses so far.
    WatchConfig { attempt: u32 },
    ResolveId {
        name: DisplayName,
        generation: u64,
        attempt: u32,
    },
    Reconfigured(Reconfiguration),
    Correct { output: OutputId },
    Shutdown,
}
