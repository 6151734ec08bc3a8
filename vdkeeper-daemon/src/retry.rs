//! Deferred actions on the event loop.
//!
//! Nothing here sleeps on the loop itself: a delayed action is a spawned
//! sleeper task that posts an [`Event`] back into the queue when it wakes.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::event::Event;

/// "Try up to N times, `delay` apart." `None` means no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn bounded(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            delay,
        }
    }

    pub const fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay,
        }
    }

    /// Delay before the next attempt after `attempts_made` failures, or
    /// `None` once the policy is exhausted.
    pub fn next_delay(&self, attempts_made: u32) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempts_made >= max => None,
            _ => Some(self.delay),
        }
    }
}

/// Posting side of the event queue.
#[derive(Debug, Clone)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<Event>,
}

impl Scheduler {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue now. Dropped silently once the loop is gone.
    pub fn post(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Enqueue after `delay`. Must be called from within the runtime.
    pub fn after(&self, delay: Duration, event: Event) -> JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        })
    }
}

/// At most one pending deferred action; arming it again cancels the old one.
#[derive(Debug, Default)]
pub struct DeferredSlot {
    pending: Option<JoinHandle<()>>,
}

impl DeferredSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, scheduler: &Scheduler, delay: Duration, event: Event) {
        self.cancel();
        self.pending = Some(scheduler.after(delay, event));
    }

    /// Returns whether a not-yet-fired action was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
