use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use core_types::InstanceId;

use crate::options::OptionsPatch;
use crate::style_registry::StyleRegistry;
use crate::timer::TimerHandle;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Status {
    pub started: bool,
    pub complete: bool,
    pub frozen: bool,
    pub destroyed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbortReason {
    Frozen,
    Destroyed,
}

/// How a run of the queue ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Aborted(AbortReason),
}

#[derive(Debug, Default)]
struct Control {
    started: AtomicBool,
    complete: AtomicBool,
    frozen: AtomicBool,
    destroyed: AtomicBool,
    timeouts: Mutex<Vec<TimerHandle>>,
    pending: Mutex<Vec<OptionsPatch>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe control surface of one instance.
///
/// The instance blocks inside its timer while running; a handle lets another thread (or a
/// callback) freeze it, tear it down, or queue option updates meanwhile.
#[derive(Clone, Debug)]
pub struct InstanceHandle {
    id: InstanceId,
    control: Arc<Control>,
    styles: StyleRegistry,
}

impl InstanceHandle {
    pub(crate) fn new(id: InstanceId, styles: StyleRegistry) -> Self {
        Self {
            id,
            control: Arc::new(Control::default()),
            styles,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn status(&self) -> Status {
        Status {
            started: self.control.started.load(Ordering::Acquire),
            complete: self.control.complete.load(Ordering::Acquire),
            frozen: self.control.frozen.load(Ordering::Acquire),
            destroyed: self.control.destroyed.load(Ordering::Acquire),
        }
    }

    /// Freeze before the next action starts. The action in flight still completes.
    pub fn pause(&self) {
        log::debug!(target: "typist.engine", "instance {} frozen", self.id);
        self.control.frozen.store(true, Ordering::Release);
    }

    pub fn unpause(&self) {
        self.control.frozen.store(false, Ordering::Release);
    }

    /// Cancel every pending timer and drop the cursor style. Terminal.
    pub fn destroy(&self) {
        if self.control.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        let timeouts = std::mem::take(&mut *lock(&self.control.timeouts));
        log::debug!(
            target: "typist.engine",
            "instance {} destroyed, cancelling {} timer(s)",
            self.id,
            timeouts.len()
        );
        for handle in timeouts {
            handle.cancel();
        }
        self.styles.teardown(self.id);
    }

    /// Merged into the options before the next action starts.
    pub fn queue_options_update(&self, patch: OptionsPatch) {
        lock(&self.control.pending).push(patch);
    }

    pub fn is_frozen(&self) -> bool {
        self.control.frozen.load(Ordering::Acquire)
    }

    pub fn is_destroyed(&self) -> bool {
        self.control.destroyed.load(Ordering::Acquire)
    }

    pub(crate) fn abort_reason(&self) -> Option<AbortReason> {
        if self.is_destroyed() {
            Some(AbortReason::Destroyed)
        } else if self.is_frozen() {
            Some(AbortReason::Frozen)
        } else {
            None
        }
    }

    /// Returns `true` only for the call that flips `started`.
    pub(crate) fn mark_started(&self) -> bool {
        !self.control.started.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn mark_complete(&self) {
        self.control.complete.store(true, Ordering::Release);
    }

    pub(crate) fn track(&self, handle: &TimerHandle) {
        let mut timeouts = lock(&self.control.timeouts);
        if self.is_destroyed() {
            handle.cancel();
            return;
        }
        timeouts.push(handle.clone());
    }

    pub(crate) fn release(&self, handle: &TimerHandle) {
        lock(&self.control.timeouts).retain(|h| !h.same_timer(handle));
    }

    #[cfg(test)]
    pub(crate) fn pending_timers(&self) -> usize {
        lock(&self.control.timeouts).len()
    }

    pub(crate) fn take_pending_updates(&self) -> Vec<OptionsPatch> {
        std::mem::take(&mut *lock(&self.control.pending))
    }
}
