//! SIGUSR1 reload trigger and termination signals.

use std::path::Path;

use nix::sys::signal::{kill, signal, SigHandler, Signal};
use nix::unistd::Pid;
use tokio::signal::unix::{signal as listen, SignalKind};
use tokio::task::JoinHandle;

use crate::error::DaemonError;
use crate::event::{Event, Trigger};
use crate::pidfile;
use crate::retry::Scheduler;

/// Set SIGUSR1 to "ignore" so a trigger that arrives before the listener is
/// installed does not terminate the process. Call before anything else.
pub fn ignore_reload_signal() {
    // SAFETY: SIG_IGN installs no handler code; nothing can run concurrently
    // with a signal handler here.
    if let Err(err) = unsafe { signal(Signal::SIGUSR1, SigHandler::SigIgn) } {
        tracing::warn!(error = %err, "could not ignore SIGUSR1");
    }
}

/// Post `Reconcile(Signal)` for every SIGUSR1.
///
/// Returns `None`, after logging, if the listener cannot be installed.
pub fn spawn_reload_listener(scheduler: Scheduler) -> Option<JoinHandle<()>> {
    let mut stream = match listen(SignalKind::user_defined1()) {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(error = %err, "SIGUSR1 listener unavailable; relying on the file watcher");
            return None;
        }
    };
    Some(tokio::spawn(async move {
        while stream.recv().await.is_some() {
            tracing::debug!("received SIGUSR1");
            scheduler.post(Event::Reconcile(Trigger::Signal));
        }
    }))
}

/// Post `Shutdown` on SIGINT or SIGTERM.
pub fn spawn_shutdown_listener(scheduler: Scheduler) -> JoinHandle<()> {
    // Registered before spawning so a SIGTERM that arrives early is not fatal.
    let mut terminate = match listen(SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(err) => {
            tracing::warn!(error = %err, "SIGTERM listener unavailable");
            None
        }
    };
    tokio::spawn(async move {
        let term = async {
            match terminate.as_mut() {
                Some(stream) => {
                    stream.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    tracing::warn!(error = %err, "ctrl-c handler failed");
                    return;
                }
                tracing::info!("received ctrl-c, shutting down daemon");
            }
            _ = term => tracing::info!("received SIGTERM, shutting down daemon"),
        }
        scheduler.post(Event::Shutdown);
    })
}

/// Ask a running daemon to reconcile now. Returns the PID signalled.
pub fn send_reload(pid_file: &Path) -> Result<i32, DaemonError> {
    let pid = pidfile::running_pid(pid_file)?.ok_or_else(|| DaemonError::DaemonNotRunning {
        pid_file: pid_file.to_path_buf(),
    })?;
    kill(Pid::from_raw(pid), Signal::SIGUSR1)?;
    Ok(pid)
}
