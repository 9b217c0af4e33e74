use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use core_types::{InstanceId, Millis};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorStyle {
    pub cursor_char: String,
    /// Full blink period.
    pub blink_period: Millis,
    pub visible: bool,
}

impl CursorStyle {
    /// Dark for the first half of each period, lit for the second.
    pub fn is_lit(&self, now: Millis) -> bool {
        if !self.visible {
            return false;
        }
        if self.blink_period == 0 {
            return true;
        }
        now % self.blink_period >= self.blink_period / 2
    }
}

/// Per-instance cursor styles. Clones share one registry.
#[derive(Clone, Debug, Default)]
pub struct StyleRegistry {
    styles: Arc<Mutex<BTreeMap<InstanceId, CursorStyle>>>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn styles(&self) -> MutexGuard<'_, BTreeMap<InstanceId, CursorStyle>> {
        self.styles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register or replace the style for `id`.
    pub fn register(&self, id: InstanceId, style: CursorStyle) {
        log::debug!(target: "typist.engine", "cursor style registered for instance {id}");
        self.styles().insert(id, style);
    }

    /// Returns whether a style was registered.
    pub fn teardown(&self, id: InstanceId) -> bool {
        let removed = self.styles().remove(&id).is_some();
        if removed {
            log::debug!(target: "typist.engine", "cursor style removed for instance {id}");
        }
        removed
    }

    pub fn cursor_style(&self, id: InstanceId) -> Option<CursorStyle> {
        self.styles().get(&id).cloned()
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.styles().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.styles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// CSS for every registered instance, in id order.
    pub fn stylesheet(&self) -> String {
        let mut out = String::new();
        for (id, style) in self.styles().iter() {
            if !style.visible {
                let _ = writeln!(out, "[data-typist-id='{id}'] .typist-cursor {{ display: none; }}");
                continue;
            }
            let _ = writeln!(
                out,
                "@keyframes blink-{id} {{ 0% {{opacity: 0}} 49% {{opacity: 0}} 50% {{opacity: 1}} }}"
            );
            let _ = writeln!(
                out,
                "[data-typist-id='{id}'] .typist-cursor {{ animation: blink-{id} {}s infinite; }}",
                style.blink_period as f64 / 1000.0
            );
        }
        out
    }
}
