use std::fs;
use std::path::Path;

use tokio::sync::mpsc;
use vdkeeper_core::ConfigStore;

use crate::error::{io_err, DaemonError};
use crate::event::{Event, Trigger};
use crate::headless::HeadlessPlatform;
use crate::options::DaemonOptions;
use crate::pidfile;
use crate::platform::DisplayPlatform;
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::retry::{DeferredSlot, Scheduler};
use crate::signal;
use crate::watcher::{ConfigWatcher, FileChange};

/// Log output format for [`start_blocking`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Whether the loop keeps going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// The single-threaded event loop and everything it owns.
pub struct Daemon<P: DisplayPlatform> {
    reconciler: Reconciler<P>,
    watcher: Option<ConfigWatcher>,
    settle: DeferredSlot,
    rewatch: DeferredSlot,
    replaced: bool,
    scheduler: Scheduler,
    events: mpsc::UnboundedReceiver<Event>,
    options: DaemonOptions,
}

impl<P: DisplayPlatform> Daemon<P> {
    pub fn new(options: DaemonOptions, platform: P) -> Self {
        let (scheduler, events) = Scheduler::channel();
        let store = ConfigStore::new(&options.config_path);
        Self {
            reconciler: Reconciler::new(platform, store, scheduler.clone(), options.timings),
            watcher: None,
            settle: DeferredSlot::new(),
            rewatch: DeferredSlot::new(),
            replaced: false,
            scheduler,
            events,
            options,
        }
    }

    /// A handle for posting events into this daemon's queue.
    pub fn scheduler(&self) -> Scheduler {
        self.scheduler.clone()
    }

    pub fn reconciler(&self) -> &Reconciler<P> {
        &self.reconciler
    }

    pub fn is_watching_config(&self) -> bool {
        self.watcher.as_ref().is_some_and(ConfigWatcher::is_watching)
    }

    /// Initial reconcile, then start watching the config file.
    ///
    /// A watcher that cannot be created leaves the daemon running on
    /// signal triggers alone.
    pub fn start(&mut self) {
        self.reconcile(Trigger::Startup);
        let watcher = ConfigWatcher::new(&self.options.config_path, self.scheduler.clone());
        self.attach_watcher(watcher);
    }

    fn attach_watcher(&mut self, watcher: Result<ConfigWatcher, DaemonError>) {
        match watcher {
            Ok(watcher) => {
                self.watcher = Some(watcher);
                self.establish_watch(0);
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "config watcher unavailable, reconciling on SIGUSR1 only",
                );
                self.watcher = None;
            }
        }
    }

    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    pub fn handle(&mut self, event: Event) -> Flow {
        match event {
            Event::Reconcile(trigger) => {
                self.reconcile(trigger);
            }
            Event::ConfigChanged(change) => {
                if change == FileChange::Replaced {
                    self.replaced = true;
                }
                self.settle
                    .replace(&self.scheduler, self.options.timings.settle, Event::ConfigSettled);
            }
            Event::ConfigSettled => {
                self.reconcile(Trigger::ConfigFile);
                if std::mem::take(&mut self.replaced) {
                    tracing::debug!("config file was replaced, re-establishing watch");
                    self.establish_watch(0);
                }
            }
            Event::WatchConfig { attempt } => self.establish_watch(attempt),
            Event::ResolveId {
                name,
                generation,
                attempt,
            } => self.reconciler.resolve_output(&name, generation, attempt),
            Event::Reconfigured(event) => self.reconciler.handle_reconfiguration(event),
            Event::Correct { output } => self.reconciler.apply_correction(output),
            Event::Shutdown => {
                self.shutdown();
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Run until a `Shutdown` event.
    pub async fn run(mut self) {
        self.start();
        while let Some(event) = self.next_event().await {
            if self.handle(event) == Flow::Stop {
                break;
            }
        }
    }

    fn reconcile(&mut self, trigger: Trigger) -> ReconcileReport {
        let report = self.reconciler.reconcile();
        if report.unchanged {
            tracing::debug!(trigger = %trigger, "config unavailable, nothing to reconcile");
        } else if report.is_noop() {
            tracing::debug!(trigger = %trigger, "displays already match config");
        } else {
            tracing::info!(
                trigger = %trigger,
                created = report.created.len(),
                removed = report.removed.len(),
                failed = report.failed.len(),
                retry_scheduled = report.retry_scheduled,
                active = self.reconciler.registry().len(),
                "reconcile completed",
            );
        }
        report
    }

    // `attempt` counts how many times the path was found missing in a row.
    fn establish_watch(&mut self, attempt: u32) {
        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };
        if watcher.establish() {
            self.rewatch.cancel();
            if attempt > 0 {
                tracing::info!(path = %watcher.path().display(), "config file appeared");
                self.reconcile(Trigger::ConfigFile);
            }
            return;
        }
        if attempt == 0 {
            tracing::info!(path = %watcher.path().display(), "config file missing, polling for it");
        }
        if let Some(delay) = self.options.timings.reappear.next_delay(attempt + 1) {
            self.rewatch.replace(
                &self.scheduler,
                delay,
                Event::WatchConfig {
                    attempt: attempt + 1,
                },
            );
        }
    }

    fn shutdown(&mut self) {
        self.settle.cancel();
        self.rewatch.cancel();
        self.watcher = None;
        self.reconciler.shutdown();
    }
}

/// Write the PID marker, install signal listeners and run the loop.
pub async fn serve<P: DisplayPlatform>(
    options: DaemonOptions,
    platform: P,
) -> Result<(), DaemonError> {
    if let Some(dir) = options.config_path.parent() {
        ensure_dir(dir)?;
    }
    let pid = std::process::id();
    pidfile::write(&options.pid_path, pid)?;

    let daemon = Daemon::new(options.clone(), platform);
    let reload = signal::spawn_reload_listener(daemon.scheduler());
    let shutdown = signal::spawn_shutdown_listener(daemon.scheduler());
    tracing::info!(
        pid,
        config = %options.config_path.display(),
        pid_file = %options.pid_path.display(),
        "vdkeeper daemon running",
    );

    daemon.run().await;

    if let Some(reload) = reload {
        reload.abort();
    }
    shutdown.abort();
    pidfile::remove_if_owned(&options.pid_path, pid);
    tracing::info!("vdkeeper daemon stopped");
    Ok(())
}

/// Start the daemon on the headless backend and block until it exits.
pub fn start_blocking(options: DaemonOptions, log_format: LogFormat) -> Result<(), DaemonError> {
    signal::ignore_reload_signal();
    init_tracing(log_format);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    tracing::info!("using headless display backend");
    runtime.block_on(serve(options, HeadlessPlatform::new()))
}

fn ensure_dir(dir: &Path) -> Result<(), DaemonError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    Ok(())
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(false);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
