//! Render-target state: the live tree of inline wrappers and character leaves an instance
//! types into, the surfaces that own it, and cursor-step calculation over it.

mod cursor;
mod selector;
mod snapshot;
mod surface;
mod tree;

pub use crate::cursor::{Edge, MoveSpec, calculate_cursor_steps};
pub use crate::selector::{Selector, SelectorError, SimpleSelector};
pub use crate::snapshot::{TreeSnapshot, text_with_cursor};
pub use crate::surface::{Container, InputField, RenderTarget};
pub use crate::tree::{NodeId, NodeKind, RenderTree};
