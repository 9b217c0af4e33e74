use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use core_types::Millis;

/// A scheduled delay that can be cancelled from any thread.
#[derive(Clone, Debug)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    due: Millis,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether both handles were produced by the same `schedule_after` call.
    pub fn same_timer(&self, other: &TimerHandle) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }

    /// Clock reading, in the owning service's milliseconds, at which the delay elapses.
    pub fn due(&self) -> Millis {
        self.due
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerOutcome {
    Elapsed,
    Cancelled,
}

pub trait TimerService: Send + Sync {
    /// Milliseconds since the service was created.
    fn now(&self) -> Millis;

    fn schedule_after(&self, delay: Millis) -> TimerHandle {
        TimerHandle {
            cancelled: Arc::new(AtomicBool::new(false)),
            due: self.now().saturating_add(delay),
        }
    }

    /// Block until the handle elapses or is cancelled.
    fn wait(&self, handle: &TimerHandle) -> TimerOutcome;
}

const POLL_SLICE: Duration = Duration::from_millis(5);

/// Wall-clock timer. Sleeps in short slices so a cancel is noticed promptly.
#[derive(Debug)]
pub struct SystemTimer {
    epoch: Instant,
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemTimer {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl TimerService for SystemTimer {
    fn now(&self) -> Millis {
        self.epoch.elapsed().as_millis() as Millis
    }

    fn wait(&self, handle: &TimerHandle) -> TimerOutcome {
        loop {
            if handle.is_cancelled() {
                return TimerOutcome::Cancelled;
            }
            let now = self.now();
            if now >= handle.due {
                return TimerOutcome::Elapsed;
            }
            let remaining = Duration::from_millis(handle.due - now);
            std::thread::sleep(remaining.min(POLL_SLICE));
        }
    }
}

#[derive(Debug, Default)]
struct VirtualClock {
    now: Millis,
    waits: Vec<Millis>,
}

/// Timer that jumps a virtual clock instead of sleeping. Clones share one clock.
#[derive(Clone, Debug, Default)]
pub struct VirtualTimer {
    clock: Arc<Mutex<VirtualClock>>,
}

impl VirtualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn clock(&self) -> std::sync::MutexGuard<'_, VirtualClock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Length of every completed wait, in order.
    pub fn waits(&self) -> Vec<Millis> {
        self.clock().waits.clone()
    }

    pub fn total_elapsed(&self) -> Millis {
        self.clock().now
    }
}

impl TimerService for VirtualTimer {
    fn now(&self) -> Millis {
        self.clock().now
    }

    fn wait(&self, handle: &TimerHandle) -> TimerOutcome {
        if handle.is_cancelled() {
            return TimerOutcome::Cancelled;
        }
        let mut clock = self.clock();
        let waited = handle.due.saturating_sub(clock.now);
        clock.now = clock.now.max(handle.due);
        clock.waits.push(waited);
        TimerOutcome::Elapsed
    }
}
