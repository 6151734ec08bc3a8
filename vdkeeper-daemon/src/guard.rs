//! Resolution guard: keeps each guarded output at its configured size.
//!
//! The guard never changes a mode from inside a reconfiguration notification.
//! [`ResolutionGuard::inspect`] only classifies; the caller defers
//! [`ResolutionGuard::correct`] until the originating transaction has settled.

use std::collections::{HashMap, HashSet};

use vdkeeper_core::{ChangeKind, DisplayMode, OutputId, Reconfiguration, Resolution};

use crate::error::PlatformError;
use crate::platform::{DisplayPlatform, ReconfigurationCallback};

/// What a notification means for the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not a mode change, or not one of ours.
    Ignored,
    InTarget,
    Drifted {
        current: Resolution,
        target: Resolution,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionOutcome {
    NotGuarded,
    AlreadyInTarget,
    NoMatchingMode,
    Applied(DisplayMode),
    Failed(PlatformError),
}

#[derive(Debug, Default)]
pub struct ResolutionGuard {
    targets: HashMap<OutputId, Resolution>,
    pending: HashSet<OutputId>,
    subscribed: bool,
}

impl ResolutionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, output: OutputId, target: Resolution) {
        self.targets.insert(output, target);
    }

    pub fn remove(&mut self, output: OutputId) -> Option<Resolution> {
        self.pending.remove(&output);
        self.targets.remove(&output)
    }

    pub fn target(&self, output: OutputId) -> Option<Resolution> {
        self.targets.get(&output).copied()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn clear(&mut self) {
        self.targets.clear();
        self.pending.clear();
    }

    /// Subscribe to reconfiguration notifications once per process.
    ///
    /// `callback` is only invoked when no subscription exists yet. A failed
    /// subscription is logged and attempted again on the next call.
    pub fn ensure_subscribed<P, F>(&mut self, platform: &P, callback: F)
    where
        P: DisplayPlatform,
        F: FnOnce() -> ReconfigurationCallback,
    {
        if self.subscribed {
            return;
        }
        match platform.subscribe_reconfiguration(callback()) {
            Ok(()) => {
                self.subscribed = true;
                tracing::info!("resolution guard subscribed to reconfiguration events");
            }
            Err(err) => {
                tracing::warn!(error = %err, "resolution guard could not subscribe");
            }
        }
    }

    pub fn inspect<P: DisplayPlatform>(&self, platform: &P, event: &Reconfiguration) -> Verdict {
        if event.kind != ChangeKind::ModeChanged {
            return Verdict::Ignored;
        }
        let Some(target) = self.target(event.output) else {
            return Verdict::Ignored;
        };
        let Some(current) = platform.current_mode(event.output) else {
            return Verdict::Ignored;
        };
        let current = current.resolution();
        if current == target {
            Verdict::InTarget
        } else {
            Verdict::Drifted { current, target }
        }
    }

    /// Mark a correction as scheduled. Returns `false` if one already is.
    pub fn mark_pending(&mut self, output: OutputId) -> bool {
        self.pending.insert(output)
    }

    pub fn is_pending(&self, output: OutputId) -> bool {
        self.pending.contains(&output)
    }

    /// Put `output` back to its target mode. Best effort, never retried here.
    pub fn correct<P: DisplayPlatform>(&mut self, platform: &P, output: OutputId) -> CorrectionOutcome {
        self.pending.remove(&output);
        let Some(target) = self.target(output) else {
            return CorrectionOutcome::NotGuarded;
        };
        if platform
            .current_mode(output)
            .is_some_and(|mode| mode.resolution() == target)
        {
            return CorrectionOutcome::AlreadyInTarget;
        }
        let Some(mode) = platform
            .list_modes(output)
            .into_iter()
            .find(|mode| mode.resolution() == target)
        else {
            return CorrectionOutcome::NoMatchingMode;
        };
        match platform.set_mode(output, &mode) {
            Ok(()) => CorrectionOutcome::Applied(mode),
            Err(err) => CorrectionOutcome::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessPlatform, PlatformOp};
    use vdkeeper_core::{DisplayName, DisplaySpec};

    fn guarded_output(platform: &HeadlessPlatform) -> (ResolutionGuard, OutputId) {
        let spec = DisplaySpec {
            name: DisplayName::from("A"),
            width: 1920,
            height: 1080,
            refresh_rate: 60.0,
            hidpi: false,
            connect_on_startup: true,
        };
        let handle = platform.create(&spec).expect("create");
        let id = platform.resolve_id(&handle).expect("id");
        let mut guard = ResolutionGuard::new();
        guard.register(id, Resolution::new(1920, 1080));
        (guard, id)
    }

    fn mode_changed(output: OutputId) -> Reconfiguration {
        Reconfiguration {
            output,
            kind: ChangeKind::ModeChanged,
        }
    }

    #[test]
    fn matching_mode_is_in_target() {
        let platform = HeadlessPlatform::new().with_first_output_id(5);
        let (guard, id) = guarded_output(&platform);
        assert_eq!(id, OutputId(5));
        assert_eq!(guard.inspect(&platform, &mode_changed(id)), Verdict::InTarget);
    }

    #[test]
    fn connect_events_and_unknown_outputs_are_ignored() {
        let platform = HeadlessPlatform::new().with_first_output_id(5);
        let (guard, id) = guarded_output(&platform);
        platform
            .simulate_mode_change(id, Resolution::new(1280, 720))
            .expect("drift");

        let connected = Reconfiguration {
            output: id,
            kind: ChangeKind::Connected,
        };
        assert_eq!(guard.inspect(&platform, &connected), Verdict::Ignored);
        assert_eq!(guard.inspect(&platform, &mode_changed(OutputId(99))), Verdict::Ignored);
    }

    #[test]
    fn drift_is_corrected_with_one_set_mode() {
        let platform = HeadlessPlatform::new().with_first_output_id(5);
        let (mut guard, id) = guarded_output(&platform);
        platform
            .simulate_mode_change(id, Resolution::new(1280, 720))
            .expect("drift");
        platform.take_operations();

        assert_eq!(
            guard.inspect(&platform, &mode_changed(id)),
            Verdict::Drifted {
                current: Resolution::new(1280, 720),
                target: Resolution::new(1920, 1080),
            }
        );
        assert!(guard.mark_pending(id));
        assert!(!guard.mark_pending(id), "second drift while pending is coalesced");

        let outcome = guard.correct(&platform, id);
        assert!(matches!(outcome, CorrectionOutcome::Applied(_)), "got {outcome:?}");
        assert!(!guard.is_pending(id));
        assert_eq!(
            platform.operations(),
            vec![PlatformOp::SetMode(OutputId(5), Resolution::new(1920, 1080))]
        );
    }

    #[test]
    fn missing_target_mode_is_a_permanent_miss() {
        let platform = HeadlessPlatform::new();
        let (mut guard, id) = guarded_output(&platform);
        platform
            .simulate_mode_change(id, Resolution::new(1280, 720))
            .expect("drift");
        platform.remove_mode(id, Resolution::new(1920, 1080));
        platform.take_operations();

        assert_eq!(guard.correct(&platform, id), CorrectionOutcome::NoMatchingMode);
        assert!(platform.operations().is_empty());
    }

    #[test]
    fn removed_output_is_not_corrected() {
        let platform = HeadlessPlatform::new();
        let (mut guard, id) = guarded_output(&platform);
        guard.remove(id);
        assert_eq!(guard.correct(&platform, id), CorrectionOutcome::NotGuarded);
        assert_eq!(guard.inspect(&platform, &mode_changed(id)), Verdict::Ignored);
    }

    #[test]
    fn subscribes_only_once() {
        let platform = HeadlessPlatform::new();
        let mut guard = ResolutionGuard::new();
        for _ in 0..3 {
            guard.ensure_subscribed(&platform, || Box::new(|_| {}));
        }
        assert!(guard.is_subscribed());
        assert_eq!(platform.subscriber_count(), 1);
    }

    #[test]
    fn refused_subscription_is_attempted_again() {
        let platform = HeadlessPlatform::new();
        platform.set_subscriptions_available(false);
        let mut guard = ResolutionGuard::new();

        guard.ensure_subscribed(&platform, || Box::new(|_| {}));
        assert!(!guard.is_subscribed());
        assert_eq!(platform.subscriber_count(), 0);

        platform.set_subscriptions_available(true);
        guard.ensure_subscribed(&platform, || Box::new(|_| {}));
        assert!(guard.is_subscribed());
        assert_eq!(platform.subscriber_count(), 1);
    }

    #[test]
    fn failed_transaction_is_reported_and_clears_pending() {
        let platform = HeadlessPlatform::new();
        let (mut guard, id) = guarded_output(&platform);
        platform
            .simulate_mode_change(id, Resolution::new(1280, 720))
            .expect("drift");
        platform.fail_set_mode(id);
        assert!(guard.mark_pending(id));

        assert!(matches!(
            guard.correct(&platform, id),
            CorrectionOutcome::Failed(PlatformError::Transaction { .. })
        ));
        assert!(!guard.is_pending(id));
        assert_eq!(guard.target(id), Some(Resolution::new(1920, 1080)));
    }
}
