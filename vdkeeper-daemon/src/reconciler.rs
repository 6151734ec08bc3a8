//! The control loop body: converge live displays toward the desired state.
//!
//! The reconciler exclusively owns the [`DisplayRegistry`] and the
//! [`ResolutionGuard`]. It is driven by the runtime, one event at a time, and
//! never blocks: every wait is a scheduled [`Event`].

use vdkeeper_core::{ConfigStore, DisplayName, LoadOutcome, OutputId, Reconfiguration};

use crate::event::{Event, Trigger};
use crate::guard::{CorrectionOutcome, ResolutionGuard, Verdict};
use crate::options::Timings;
use crate::platform::{DisplayPlatform, ReconfigurationCallback};
use crate::registry::DisplayRegistry;
use crate::retry::{DeferredSlot, Scheduler};

/// What one `reconcile` pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// The config could not be loaded; nothing was touched.
    pub unchanged: bool,
    pub removed: Vec<DisplayName>,
    pub created: Vec<DisplayName>,
    pub failed: Vec<DisplayName>,
    pub retry_scheduled: bool,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.created.is_empty() && self.failed.is_empty()
    }
}

pub struct Reconciler<P: DisplayPlatform> {
    platform: P,
    store: ConfigStore,
    registry: DisplayRegistry<P::Handle>,
    guard: ResolutionGuard,
    retry: DeferredSlot,
    scheduler: Scheduler,
    timings: Timings,
}

impl<P: DisplayPlatform> Reconciler<P> {
    pub fn new(platform: P, store: ConfigStore, scheduler: Scheduler, timings: Timings) -> Self {
        Self {
            platform,
            store,
            registry: DisplayRegistry::new(),
            guard: ResolutionGuard::new(),
            retry: DeferredSlot::new(),
            scheduler,
            timings,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn registry(&self) -> &DisplayRegistry<P::Handle> {
        &self.registry
    }

    pub fn guard(&self) -> &ResolutionGuard {
        &self.guard
    }

    pub fn retry_pending(&self) -> bool {
        self.retry.is_pending()
    }

    pub fn reconcile(&mut self) -> ReconcileReport {
        let desired = match self.store.load() {
            LoadOutcome::Desired(desired) => desired,
            LoadOutcome::Unchanged => {
                return ReconcileReport {
                    unchanged: true,
                    ..ReconcileReport::default()
                }
            }
        };
        let mut report = ReconcileReport::default();

        // Removal always precedes creation so a freed slot is available to
        // the displays created below.
        for name in self.registry.names() {
            let keep = match (self.registry.get(&name), desired.get(&name)) {
                (Some(active), Some(wanted)) => &active.spec == wanted,
                _ => false,
            };
            if keep {
                continue;
            }
            self.remove_display(&name);
            report.removed.push(name);
        }

        for spec in desired.specs() {
            if self.registry.contains(&spec.name) {
                continue;
            }
            match self.platform.create(spec) {
                Ok(handle) => {
                    tracing::info!(
                        name = %spec.name,
                        resolution = %spec.resolution(),
                        refresh_rate = spec.refresh_rate,
                        hidpi = spec.hidpi,
                        "virtual display created",
                    );
                    let generation = self.registry.insert(spec.clone(), handle);
                    report.created.push(spec.name.clone());
                    self.resolve_output(&spec.name, generation, 1);
                }
                Err(err) => {
                    tracing::warn!(name = %spec.name, error = %err, "virtual display creation failed");
                    report.failed.push(spec.name.clone());
                }
            }
        }

        if report.failed.is_empty() {
            if self.retry.cancel() {
                tracing::debug!("pending retry cancelled, every display is up");
            }
        } else {
            self.retry.replace(
                &self.scheduler,
                self.timings.create_retry,
                Event::Reconcile(Trigger::Retry),
            );
            report.retry_scheduled = true;
            tracing::warn!(
                failed = report.failed.len(),
                retry_in_secs = self.timings.create_retry.as_secs_f64(),
                "scheduled reconcile retry",
            );
        }
        report
    }

    /// One attempt to learn the output id of `name` as created at `generation`.
    ///
    /// `attempt` is 1-based. Drops silently if the display has since been
    /// removed or replaced.
    pub fn resolve_output(&mut self, name: &DisplayName, generation: u64, attempt: u32) {
        let Some(active) = self.registry.current(name, generation) else {
            tracing::debug!(name = %name, generation, "dropping id poll for a display that is gone");
            return;
        };
        let target = active.spec.resolution();

        let Some(id) = self.platform.resolve_id(&active.handle) else {
            match self.timings.resolve.next_delay(attempt) {
                Some(delay) => {
                    tracing::debug!(name = %name, attempt, "output id not assigned yet");
                    self.scheduler.after(
                        delay,
                        Event::ResolveId {
                            name: name.clone(),
                            generation,
                            attempt: attempt + 1,
                        },
                    );
                }
                None => tracing::warn!(
                    name = %name,
                    attempts = attempt,
                    "could not obtain output id, resolution guard inactive for this display",
                ),
            }
            return;
        };

        self.registry.set_resolved(name, generation, id);
        self.guard.register(id, target);
        let scheduler = self.scheduler.clone();
        self.guard
            .ensure_subscribed(&self.platform, move || -> ReconfigurationCallback {
                Box::new(move |event: Reconfiguration| scheduler.post(Event::Reconfigured(event)))
            });
        tracing::info!(name = %name, output = %id, target = %target, "guarding display");
    }

    pub fn handle_reconfiguration(&mut self, event: Reconfiguration) {
        match self.guard.inspect(&self.platform, &event) {
            Verdict::Ignored => {}
            Verdict::InTarget => {
                tracing::trace!(output = %event.output, "mode change kept target resolution");
            }
            Verdict::Drifted { current, target } => {
                if !self.guard.mark_pending(event.output) {
                    tracing::debug!(output = %event.output, "correction already scheduled");
                    return;
                }
                tracing::info!(
                    output = %event.output,
                    current = %current,
                    target = %target,
                    "resolution drift, restoring shortly",
                );
                // The platform's configuration transaction is still open here.
                self.scheduler.after(
                    self.timings.correction,
                    Event::Correct {
                        output: event.output,
                    },
                );
            }
        }
    }

    pub fn apply_correction(&mut self, output: OutputId) {
        match self.guard.correct(&self.platform, output) {
            CorrectionOutcome::NotGuarded => {
                tracing::debug!(output = %output, "output no longer guarded, skipping correction");
            }
            CorrectionOutcome::AlreadyInTarget => {
                tracing::debug!(output = %output, "output already back at target");
            }
            CorrectionOutcome::NoMatchingMode => {
                tracing::warn!(output = %output, "no mode matching the target resolution");
            }
            CorrectionOutcome::Applied(mode) => {
                tracing::info!(output = %output, mode = %mode, "forced target resolution");
            }
            CorrectionOutcome::Failed(err) => {
                tracing::error!(output = %output, error = %err, "could not restore target resolution");
            }
        }
    }

    /// Cancel the pending retry and destroy every live display.
    pub fn shutdown(&mut self) {
        self.retry.cancel();
        self.guard.clear();
        for active in self.registry.drain() {
            tracing::info!(name = %active.spec.name, "destroying virtual display");
            self.platform.destroy(active.handle);
        }
    }

    fn remove_display(&mut self, name: &DisplayName) {
        let Some(active) = self.registry.remove(name) else {
            return;
        };
        if let Some(id) = active.resolved_id {
            self.guard.remove(id);
        }
        self.platform.destroy(active.handle);
        tracing::info!(name = %name, "virtual display removed");
    }
}
