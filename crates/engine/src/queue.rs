use std::ops::Range;

use crate::action::Action;

/// Pending and executed actions.
///
/// Index-based: every mutation is synchronous and positions refer to `waiting` as it is at
/// the moment of the call.
#[derive(Clone, Debug)]
pub struct Queue {
    waiting: Vec<Action>,
    executed: Vec<Action>,
    home: Action,
}

impl Queue {
    /// A queue holding only `home`.
    pub fn new(home: Action) -> Self {
        Self::with_waiting(home.clone(), vec![home])
    }

    /// A queue taking over an already-built list, e.g. from a reset instance.
    pub fn with_waiting(home: Action, waiting: Vec<Action>) -> Self {
        Self {
            waiting,
            executed: Vec::new(),
            home,
        }
    }

    pub fn waiting(&self) -> &[Action] {
        &self.waiting
    }

    pub fn executed(&self) -> &[Action] {
        &self.executed
    }

    pub fn home(&self) -> &Action {
        &self.home
    }

    pub fn add(&mut self, action: Action, to_front: bool) -> &mut Self {
        if to_front {
            self.waiting.insert(0, action);
        } else {
            self.waiting.push(action);
        }
        self
    }

    /// Insert at `position`, clamped to the end.
    pub fn insert_at(&mut self, position: usize, action: Action) -> &mut Self {
        let position = position.min(self.waiting.len());
        self.waiting.insert(position, action);
        self
    }

    /// Remove the waiting action at `position`; out of range is a no-op.
    pub fn delete(&mut self, position: usize) -> &mut Self {
        if position < self.waiting.len() {
            self.waiting.remove(position);
        }
        self
    }

    /// Bracket the waiting actions in `range` with a pause before and after.
    ///
    /// The after-pause is inserted first so the range start stays valid.
    pub fn wrap_with_pauses(&mut self, range: Range<usize>, before: Action, after: Action) {
        let start = range.start.min(self.waiting.len());
        let end = range.end.clamp(start, self.waiting.len());
        self.waiting.insert(end, after);
        self.waiting.insert(start, before);
    }

    /// Put executed actions back in front of whatever is still waiting, ready to replay.
    pub fn reset(&mut self) -> &mut Self {
        let mut replay = std::mem::take(&mut self.executed);
        replay.append(&mut self.waiting);
        self.waiting = replay;
        if self.waiting.is_empty() {
            self.waiting.push(self.home.clone());
        }
        self
    }

    pub(crate) fn front(&self) -> Option<&Action> {
        self.waiting.first()
    }

    pub(crate) fn shift(&mut self) -> Option<Action> {
        if self.waiting.is_empty() {
            None
        } else {
            Some(self.waiting.remove(0))
        }
    }

    pub(crate) fn record_executed(&mut self, action: Action) {
        self.executed.push(action);
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}
