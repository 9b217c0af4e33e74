//! Tokenizer for the inline-markup subset used by typed strings.
//!
//! The pipeline is `strip_comments` -> `tokenize` -> `markup_to_units`: a string such as
//! `Hi, <strong class='t'>Bob!</strong>` becomes eight [`TypedUnit`]s, the last four carrying
//! the `strong` element they must be typed inside.

mod entities;
mod tokenizer;
mod types;
mod units;

pub use crate::tokenizer::{strip_comments, tokenize};
pub use crate::types::{Ancestor, Attributes, Token, TypedUnit};
pub use crate::units::{markup_to_units, string_to_units, unit_count};
