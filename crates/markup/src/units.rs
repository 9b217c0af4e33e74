use crate::tokenizer::{strip_comments, tokenize};
use crate::types::{Ancestor, Token, TypedUnit};
use std::sync::Arc;

/// Turn a typed string into the ordered character units that will be typed one by one.
///
/// With `html` disabled every `char` becomes a plain unit, markup included.
pub fn string_to_units(input: &str, html: bool) -> Vec<TypedUnit> {
    if html {
        markup_to_units(input)
    } else {
        input.chars().map(TypedUnit::Plain).collect()
    }
}

/// Number of units `string_to_units` yields, i.e. how many deletions erase the string.
pub fn unit_count(input: &str, html: bool) -> usize {
    if html {
        markup_to_units(input).len()
    } else {
        input.chars().count()
    }
}

/// Tokenize inline markup into units annotated with their enclosing elements.
///
/// Best effort: unmatched end tags are ignored, unclosed elements stay open until the end,
/// empty or void elements produce nothing except `<br>`, which types as `'\n'`.
pub fn markup_to_units(input: &str) -> Vec<TypedUnit> {
    let cleaned = strip_comments(input);
    let mut builder = UnitBuilder::default();
    for token in tokenize(&cleaned) {
        builder.push(token);
    }
    builder.finish()
}

#[derive(Default)]
struct UnitBuilder {
    /// Outermost first.
    open_elements: Vec<Ancestor>,
    /// Innermost-first view of `open_elements`, rebuilt lazily after the stack changes.
    chain: Option<Arc<[Ancestor]>>,
    out: Vec<TypedUnit>,
}

impl UnitBuilder {
    fn push(&mut self, token: Token) {
        match token {
            Token::Text(text) => {
                for c in text.chars() {
                    self.emit(c);
                }
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if name == "br" {
                    self.emit('\n');
                    return;
                }
                if self_closing {
                    return;
                }
                self.open_elements.push(Ancestor {
                    tag: name,
                    attributes,
                });
                self.chain = None;
            }
            Token::EndTag(name) => {
                let Some(pos) = self.open_elements.iter().rposition(|a| a.tag == name) else {
                    log::trace!(target: "typist.markup", "ignoring unmatched </{name}>");
                    return;
                };
                self.open_elements.truncate(pos);
                self.chain = None;
            }
        }
    }

    fn emit(&mut self, content: char) {
        if self.open_elements.is_empty() {
            self.out.push(TypedUnit::Plain(content));
            return;
        }
        let open = &self.open_elements;
        let ancestors = self
            .chain
            .get_or_insert_with(|| open.iter().rev().cloned().collect())
            .clone();
        self.out.push(TypedUnit::Structured { content, ancestors });
    }

    fn finish(self) -> Vec<TypedUnit> {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(units: &[TypedUnit]) -> String {
        units.iter().map(TypedUnit::content).collect()
    }

    fn tags(unit: &TypedUnit) -> Vec<&str> {
        unit.ancestors().iter().map(|a| a.tag.as_str()).collect()
    }

    #[test]
    fn plain_text_yields_plain_units() {
        let units = markup_to_units("Hey!");
        assert_eq!(units.len(), 4);
        assert!(units.iter().all(|u| matches!(u, TypedUnit::Plain(_))));
    }

    #[test]
    fn nested_characters_carry_innermost_first_chain() {
        let units = markup_to_units("Hi, <strong class='t'>Bob! <em>Bye</em></strong>");
        assert_eq!(contents(&units), "Hi, Bob! Bye");
        assert!(tags(&units[0]).is_empty());
        assert_eq!(tags(&units[4]), ["strong"]);
        assert_eq!(units[4].attributes(), [("class".to_string(), Some("t".to_string()))]);
        assert_eq!(tags(&units[9]), ["em", "strong"]);
        assert!(units[9].attributes().is_empty());
        assert_eq!(units[9].ancestors()[1].attribute("class"), Some("t"));
    }

    #[test]
    fn run_shares_one_chain_allocation() {
        let units = markup_to_units("<b>abc</b>");
        let (TypedUnit::Structured { ancestors: a, .. }, TypedUnit::Structured { ancestors: b, .. }) =
            (&units[0], &units[2])
        else {
            panic!("expected structured units, got {units:?}");
        };
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn comments_never_produce_units() {
        let units = markup_to_units("a<!-- <b>x</b> -->b");
        assert_eq!(contents(&units), "ab");
    }

    #[test]
    fn br_types_as_newline_inside_current_chain() {
        let units = markup_to_units("<em>a<br>b</em>");
        assert_eq!(contents(&units), "a\nb");
        assert_eq!(tags(&units[1]), ["em"]);
        assert!(units[1].is_line_break());
    }

    #[test]
    fn empty_and_void_elements_are_dropped() {
        let units = markup_to_units("a<span class='x'></span><img src=y>b");
        assert_eq!(contents(&units), "ab");
        assert!(units.iter().all(|u| u.ancestors().is_empty()));
    }

    #[test]
    fn unmatched_closer_is_ignored_and_unclosed_element_stays_open() {
        let units = markup_to_units("a</i><b>c");
        assert_eq!(contents(&units), "ac");
        assert!(tags(&units[0]).is_empty());
        assert_eq!(tags(&units[1]), ["b"]);
    }

    #[test]
    fn misnested_closer_closes_everything_above_match() {
        let units = markup_to_units("<b><i>x</b>y");
        assert_eq!(tags(&units[0]), ["i", "b"]);
        assert!(tags(&units[1]).is_empty());
    }

    #[test]
    fn unknown_tags_are_plain_wrappers() {
        let units = markup_to_units("<my-tag data-a=1>z</my-tag>");
        assert_eq!(tags(&units[0]), ["my-tag"]);
    }

    #[test]
    fn html_disabled_types_markup_literally() {
        let units = string_to_units("<b>x</b>", false);
        assert_eq!(contents(&units), "<b>x</b>");
        assert_eq!(unit_count("<b>x</b>", false), 8);
        assert_eq!(unit_count("<b>x</b>", true), 1);
    }

    #[test]
    fn tokenization_is_deterministic() {
        let input = "One <a href='#'>two <em>three</em></a> four";
        assert_eq!(markup_to_units(input), markup_to_units(input));
    }
}
