use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::control::RunOutcome;

/// Answers whether the surface is currently on screen.
pub trait VisibilityProbe: Send + Sync {
    fn is_visible(&self) -> bool;
}

/// A probe a driver flips as the surface scrolls in or out. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct VisibilityFlag {
    visible: Arc<AtomicBool>,
}

impl VisibilityFlag {
    pub fn new(visible: bool) -> Self {
        Self {
            visible: Arc::new(AtomicBool::new(visible)),
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Release);
    }
}

impl VisibilityProbe for VisibilityFlag {
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    AlreadyStarted,
    /// Waiting for `notify_visibility` while the surface is hidden.
    Deferred,
    Ran(RunOutcome),
}
