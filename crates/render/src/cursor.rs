//! Cursor-step calculation.
//!
//! Offsets count characters from the END of the rendered stream, so `0` sits after the last
//! character. A returned step count is added to the offset: positive walks toward the start,
//! negative toward the end.

use std::str::FromStr;

use crate::selector::Selector;
use crate::surface::RenderTarget;

/// Where a cursor move is headed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveSpec {
    /// Relative move by a signed number of characters.
    Chars(i64),
    /// An edge of the first element matching the selector.
    Selector(String),
    /// An edge of the whole surface.
    Absolute,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Edge {
    #[default]
    Start,
    End,
}

impl Edge {
    /// `"end"` in any case is the end; anything else means the start.
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("end") {
            Edge::End
        } else {
            Edge::Start
        }
    }
}

impl FromStr for Edge {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

/// Steps needed to bring the cursor from `cursor` to the requested position.
///
/// Never fails: a selector that does not parse or matches nothing yields 0, and the cursor is
/// clamped into the rendered stream before measuring.
pub fn calculate_cursor_steps<T>(target: &T, spec: &MoveSpec, cursor: usize, edge: Edge) -> i64
where
    T: RenderTarget + ?Sized,
{
    let total = target.char_count() as i64;
    let cursor = (cursor as i64).clamp(0, total);

    match spec {
        MoveSpec::Chars(n) => -n,
        MoveSpec::Absolute => match edge {
            Edge::Start => total - cursor,
            Edge::End => -cursor,
        },
        MoveSpec::Selector(raw) => {
            let Some((before, inside)) = selector_span(target, raw) else {
                return 0;
            };
            let from_end = match edge {
                Edge::Start => total - before,
                Edge::End => total - before - inside,
            };
            from_end - cursor
        }
    }
}

/// Characters before the first match and characters inside it.
fn selector_span<T>(target: &T, raw: &str) -> Option<(i64, i64)>
where
    T: RenderTarget + ?Sized,
{
    let tree = target.tree()?;
    let selector = match Selector::parse(raw) {
        Ok(selector) => selector,
        Err(err) => {
            log::warn!(target: "typist.render", "cursor move ignored: {err}");
            return None;
        }
    };
    let Some(element) = tree.query_selector(&selector) else {
        log::debug!(target: "typist.render", "cursor move ignored: nothing matches {raw:?}");
        return None;
    };
    let span = tree.char_span(element)?;
    Some((span.start as i64, span.len() as i64))
}
