//! In-process display backend.
//!
//! Models the parts of a display server the daemon depends on: a bounded
//! number of virtual display slots, output ids that only become visible a few
//! polls after creation, per-output mode lists and a reconfiguration stream.
//! Clones share state, so a caller can keep one clone to inspect the backend
//! or to simulate outside actors (another process holding a slot, a user
//! switching resolution) while the daemon owns another.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vdkeeper_core::{
    ChangeKind, DisplayMode, DisplayName, DisplaySpec, OutputId, Reconfiguration, Resolution,
};

use crate::error::PlatformError;
use crate::platform::{DisplayPlatform, ReconfigurationCallback};

pub const DEFAULT_CAPACITY: usize = 8;
pub const DEFAULT_FIRST_OUTPUT_ID: u32 = 1;

/// Side-effecting calls the backend has received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformOp {
    Create(DisplayName),
    Destroy(DisplayName),
    SetMode(OutputId, Resolution),
    Subscribe,
}

/// Owned slot token returned by [`HeadlessPlatform::create`].
#[derive(Debug)]
pub struct HeadlessHandle {
    slot: u64,
}

#[derive(Debug)]
struct VirtualOutput {
    name: DisplayName,
    id: OutputId,
    polls_until_visible: u32,
    modes: Vec<DisplayMode>,
    current: DisplayMode,
}

struct State {
    capacity: usize,
    next_output_id: u32,
    resolve_delay: u32,
    next_slot: u64,
    outputs: BTreeMap<u64, VirtualOutput>,
    refused: HashSet<DisplayName>,
    failing_outputs: HashSet<OutputId>,
    subscriptions_unavailable: bool,
    subscribers: Vec<Arc<ReconfigurationCallback>>,
    operations: Vec<PlatformOp>,
}

impl State {
    fn output(&self, id: OutputId) -> Option<&VirtualOutput> {
        self.outputs.values().find(|o| o.id == id && o.polls_until_visible == 0)
    }

    fn output_mut(&mut self, id: OutputId) -> Option<&mut VirtualOutput> {
        self.outputs
            .values_mut()
            .find(|o| o.id == id && o.polls_until_visible == 0)
    }
}

#[derive(Clone)]
pub struct HeadlessPlatform {
    state: Arc<Mutex<State>>,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                capacity: DEFAULT_CAPACITY,
                next_output_id: DEFAULT_FIRST_OUTPUT_ID,
                resolve_delay: 0,
                next_slot: 0,
                outputs: BTreeMap::new(),
                refused: HashSet::new(),
                failing_outputs: HashSet::new(),
                subscriptions_unavailable: false,
                subscribers: Vec::new(),
                operations: Vec::new(),
            })),
        }
    }

    /// Maximum number of simultaneously existing virtual displays.
    pub fn with_capacity(self, capacity: usize) -> Self {
        self.lock().capacity = capacity;
        self
    }

    /// Output id handed to the next created display; later ones count up.
    pub fn with_first_output_id(self, id: u32) -> Self {
        self.lock().next_output_id = id;
        self
    }

    /// Number of `resolve_id` calls that return `None` after each creation.
    pub fn with_resolve_delay(self, polls: u32) -> Self {
        self.lock().resolve_delay = polls;
        self
    }

    /// Make creation of `name` fail as if another process held its slot.
    pub fn refuse(&self, name: impl Into<DisplayName>) {
        self.lock().refused.insert(name.into());
    }

    pub fn allow(&self, name: impl Into<DisplayName>) {
        self.lock().refused.remove(&name.into());
    }

    /// Make every `set_mode` on `output` fail its configuration transaction.
    pub fn fail_set_mode(&self, output: OutputId) {
        self.lock().failing_outputs.insert(output);
    }

    pub fn restore_set_mode(&self, output: OutputId) {
        self.lock().failing_outputs.remove(&output);
    }

    /// Toggle whether `subscribe_reconfiguration` is refused.
    pub fn set_subscriptions_available(&self, available: bool) {
        self.lock().subscriptions_unavailable = !available;
    }

    /// An outside actor switches `output` to `resolution`.
    ///
    /// The mode is added to the output's list if missing, then a
    /// `ModeChanged` notification is delivered.
    pub fn simulate_mode_change(
        &self,
        output: OutputId,
        resolution: Resolution,
    ) -> Result<(), PlatformError> {
        {
            let mut state = self.lock();
            let out = state
                .output_mut(output)
                .ok_or(PlatformError::UnknownOutput(output.0))?;
            let mode = match out
                .modes
                .iter()
                .find(|m| m.resolution() == resolution)
            {
                Some(mode) => *mode,
                None => {
                    let mode = DisplayMode {
                        width: resolution.width,
                        height: resolution.height,
                        refresh_rate: out.current.refresh_rate,
                    };
                    out.modes.push(mode);
                    mode
                }
            };
            out.current = mode;
        }
        self.notify(output, ChangeKind::ModeChanged);
        Ok(())
    }

    /// Deliver a notification without changing anything.
    pub fn simulate_notification(&self, output: OutputId, kind: ChangeKind) {
        self.notify(output, kind);
    }

    /// Drop `resolution` from the modes `output` offers.
    pub fn remove_mode(&self, output: OutputId, resolution: Resolution) {
        if let Some(out) = self.lock().output_mut(output) {
            out.modes.retain(|m| m.resolution() != resolution);
        }
    }

    pub fn output_id_of(&self, name: &DisplayName) -> Option<OutputId> {
        self.lock()
            .outputs
            .values()
            .find(|o| &o.name == name && o.polls_until_visible == 0)
            .map(|o| o.id)
    }

    pub fn current_resolution(&self, output: OutputId) -> Option<Resolution> {
        self.current_mode(output).map(|m| m.resolution())
    }

    /// Names of every display currently alive, in creation order.
    pub fn live_displays(&self) -> Vec<DisplayName> {
        self.lock().outputs.values().map(|o| o.name.clone()).collect()
    }

    pub fn operations(&self) -> Vec<PlatformOp> {
        self.lock().operations.clone()
    }

    /// Return and forget the recorded operations.
    pub fn take_operations(&self) -> Vec<PlatformOp> {
        std::mem::take(&mut self.lock().operations)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Callbacks run after the lock is released.
    fn notify(&self, output: OutputId, kind: ChangeKind) {
        let subscribers = self.lock().subscribers.clone();
        for callback in subscribers {
            callback(Reconfiguration { output, kind });
        }
    }
}

fn modes_for(spec: &DisplaySpec) -> Result<Vec<DisplayMode>, PlatformError> {
    let mut modes = vec![DisplayMode {
        width: spec.width,
        height: spec.height,
        refresh_rate: spec.refresh_rate,
    }];
    if spec.hidpi {
        let (Some(width), Some(height)) = (spec.width.checked_mul(2), spec.height.checked_mul(2))
        else {
            return Err(PlatformError::Rejected {
                name: spec.name.0.clone(),
                reason: format!("backing store for {} exceeds the addressable size", spec.resolution()),
            });
        };
        modes.push(DisplayMode {
            width,
            height,
            refresh_rate: spec.refresh_rate,
        });
    }
    Ok(modes)
}

impl DisplayPlatform for HeadlessPlatform {
    type Handle = HeadlessHandle;

    fn create(&self, spec: &DisplaySpec) -> Result<HeadlessHandle, PlatformError> {
        let (slot, id) = {
            let mut state = self.lock();
            state.operations.push(PlatformOp::Create(spec.name.clone()));
            if state.refused.contains(&spec.name) || state.outputs.len() >= state.capacity {
                return Err(PlatformError::SlotUnavailable(spec.name.0.clone()));
            }
            let modes = modes_for(spec)?;
            let slot = state.next_slot;
            state.next_slot += 1;
            let id = OutputId(state.next_output_id);
            state.next_output_id += 1;
            let polls_until_visible = state.resolve_delay;
            state.outputs.insert(
                slot,
                VirtualOutput {
                    name: spec.name.clone(),
                    id,
                    polls_until_visible,
                    current: modes[0],
                    modes,
                },
            );
            (slot, id)
        };
        self.notify(id, ChangeKind::Connected);
        Ok(HeadlessHandle { slot })
    }

    fn resolve_id(&self, handle: &HeadlessHandle) -> Option<OutputId> {
        let mut state = self.lock();
        let out = state.outputs.get_mut(&handle.slot)?;
        if out.polls_until_visible > 0 {
            out.polls_until_visible -= 1;
            return None;
        }
        Some(out.id)
    }

    fn current_mode(&self, output: OutputId) -> Option<DisplayMode> {
        self.lock().output(output).map(|o| o.current)
    }

    fn list_modes(&self, output: OutputId) -> Vec<DisplayMode> {
        self.lock()
            .output(output)
            .map(|o| o.modes.clone())
            .unwrap_or_default()
    }

    fn set_mode(&self, output: OutputId, mode: &DisplayMode) -> Result<(), PlatformError> {
        {
            let mut state = self.lock();
            state
                .operations
                .push(PlatformOp::SetMode(output, mode.resolution()));
            if state.failing_outputs.contains(&output) {
                return Err(PlatformError::Transaction {
                    output: output.0,
                    reason: "configuration transaction was not committed".to_string(),
                });
            }
            let out = state
                .output_mut(output)
                .ok_or(PlatformError::UnknownOutput(output.0))?;
            if !out.modes.contains(mode) {
                return Err(PlatformError::Transaction {
                    output: output.0,
                    reason: format!("mode {mode} is not offered"),
                });
            }
            out.current = *mode;
        }
        self.notify(output, ChangeKind::ModeChanged);
        Ok(())
    }

    fn destroy(&self, handle: HeadlessHandle) {
        let removed = {
            let mut state = self.lock();
            let removed = state.outputs.remove(&handle.slot);
            if let Some(out) = &removed {
                state.operations.push(PlatformOp::Destroy(out.name.clone()));
            }
            removed
        };
        if let Some(out) = removed {
            self.notify(out.id, ChangeKind::Disconnected);
        }
    }

    fn subscribe_reconfiguration(
        &self,
        callback: ReconfigurationCallback,
    ) -> Result<(), PlatformError> {
        let mut state = self.lock();
        state.operations.push(PlatformOp::Subscribe);
        if state.subscriptions_unavailable {
            return Err(PlatformError::SubscriptionUnavailable(
                "display server is not accepting callbacks".to_string(),
            ));
        }
        state.subscribers.push(Arc::new(callback));
        Ok(())
    }
}
