use core_types::Millis;
use markup::TypedUnit;
use render::{Edge, MoveSpec};

use crate::options::OptionsPatch;

/// What a queued action does when it runs.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// Type one unit at the cursor.
    Type(TypedUnit),
    /// Delete the character left of the cursor, or every character when `until_empty`.
    Delete { until_empty: bool },
    /// Wait. `None` waits the full next-string delay.
    Pause(Option<Millis>),
    /// Merge options for every following action.
    SetOptions(OptionsPatch),
    /// Walk the cursor, one step per type pace, to a position measured when the action runs.
    MoveCursor { spec: MoveSpec, to: Edge },
    /// Clear the surface at once.
    Empty,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActionMeta {
    /// First unit of a typed string; fires `before_string`.
    pub is_first: bool,
    /// Last unit of a typed string; fires `after_string`.
    pub is_last: bool,
    /// Synthesized for looping. Skips the after-callbacks and never lands in `executed`.
    pub is_phantom: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    pub op: Operation,
    pub meta: ActionMeta,
}

impl Action {
    pub fn new(op: Operation) -> Self {
        Self {
            op,
            meta: ActionMeta::default(),
        }
    }

    pub fn with_meta(op: Operation, meta: ActionMeta) -> Self {
        Self { op, meta }
    }

    pub fn type_unit(unit: TypedUnit) -> Self {
        Self::new(Operation::Type(unit))
    }

    pub fn delete() -> Self {
        Self::new(Operation::Delete { until_empty: false })
    }

    pub fn delete_all() -> Self {
        Self::new(Operation::Delete { until_empty: true })
    }

    pub fn pause(ms: Millis) -> Self {
        Self::new(Operation::Pause(Some(ms)))
    }

    pub fn phantom_delete() -> Self {
        Self::with_meta(
            Operation::Delete { until_empty: false },
            ActionMeta {
                is_phantom: true,
                ..ActionMeta::default()
            },
        )
    }

    pub fn is_phantom(&self) -> bool {
        self.meta.is_phantom
    }

    /// Short label for logs and test traces.
    pub fn label(&self) -> String {
        match &self.op {
            Operation::Type(unit) => format!("type {:?}", unit.content()),
            Operation::Delete { until_empty: true } => "delete-all".to_string(),
            Operation::Delete { until_empty: false } if self.meta.is_phantom => {
                "phantom-delete".to_string()
            }
            Operation::Delete { until_empty: false } => "delete".to_string(),
            Operation::Pause(Some(ms)) => format!("pause {ms}"),
            Operation::Pause(None) => "pause".to_string(),
            Operation::SetOptions(_) => "options".to_string(),
            Operation::MoveCursor { spec, to } => format!("move {spec:?} {to:?}"),
            Operation::Empty => "empty".to_string(),
        }
    }
}
