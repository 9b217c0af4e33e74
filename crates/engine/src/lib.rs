//! Action-queue execution engine.
//!
//! An [`Instance`] expands its configured strings into a [`Queue`] of type, delete, and pause
//! actions and executes them one at a time against a render target, holding in a
//! [`TimerService`] between actions. Runs end in an explicit [`RunOutcome`]; freezing or
//! destroying through an [`InstanceHandle`] aborts before the next action starts.

mod action;
mod control;
mod instance;
mod options;
mod pace;
mod queue;
mod style_registry;
mod timer;
mod visibility;

pub use crate::action::{Action, ActionMeta, Operation};
pub use crate::control::{AbortReason, InstanceHandle, RunOutcome, Status};
pub use crate::instance::{Instance, InstanceConfig};
pub use crate::options::{
    Callbacks, CompleteCallback, ConfigError, Delay, Options, OptionsPatch, StepCallback,
};
pub use crate::pace::{Pace, Pacer};
pub use crate::queue::Queue;
pub use crate::style_registry::{CursorStyle, StyleRegistry};
pub use crate::timer::{SystemTimer, TimerHandle, TimerOutcome, TimerService, VirtualTimer};
pub use crate::visibility::{InitOutcome, VisibilityFlag, VisibilityProbe};
