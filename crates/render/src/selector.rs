use crate::tree::{NodeId, NodeKind, RenderTree};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimpleSelector {
    Universal,
    Type(String),  // element/tag selector
    Id(String),    // #id selector
    Class(String), // .class selector
}

/// Simple selectors that must all hold for one element, e.g. `strong.t`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Compound(Vec<SimpleSelector>);

/// Compounds joined by descendant combinators, outermost first (`strong em`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorError {
    Empty,
    Unsupported(String),
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorError::Empty => f.write_str("empty selector"),
            SelectorError::Unsupported(s) => write!(f, "unsupported selector syntax: {s:?}"),
        }
    }
}

impl std::error::Error for SelectorError {}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

// input: "strong.t#x", ".t", "em", "*"
fn parse_compound(s: &str) -> Result<Compound, SelectorError> {
    let unsupported = || SelectorError::Unsupported(s.to_string());
    let mut parts = Vec::new();
    let mut rest = s;

    if let Some(after) = rest.strip_prefix('*') {
        parts.push(SimpleSelector::Universal);
        rest = after;
    } else {
        let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
        if end > 0 {
            parts.push(SimpleSelector::Type(rest[..end].to_ascii_lowercase()));
            rest = &rest[end..];
        }
    }

    while let Some(marker) = rest.chars().next() {
        if marker != '.' && marker != '#' {
            return Err(unsupported());
        }
        let body = &rest[marker.len_utf8()..];
        let end = body.find(|c: char| !is_ident_char(c)).unwrap_or(body.len());
        if end == 0 {
            return Err(unsupported());
        }
        let ident = body[..end].to_string();
        if marker == '.' {
            parts.push(SimpleSelector::Class(ident));
        } else {
            parts.push(SimpleSelector::Id(ident));
        }
        rest = &body[end..];
    }

    if parts.is_empty() {
        return Err(unsupported());
    }
    Ok(Compound(parts))
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let compounds = input
            .split_whitespace()
            .map(parse_compound)
            .collect::<Result<Vec<_>, _>>()?;
        if compounds.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self { compounds })
    }

    /// Right-to-left match: the last compound against `id`, the rest against its ancestors.
    pub fn matches(&self, tree: &RenderTree, id: NodeId) -> bool {
        let Some((subject, ancestors)) = self.compounds.split_last() else {
            return false;
        };
        if !compound_matches(tree, id, subject) {
            return false;
        }
        let mut current = tree.parent(id);
        for compound in ancestors.iter().rev() {
            loop {
                let Some(candidate) = current else {
                    return false;
                };
                current = tree.parent(candidate);
                if compound_matches(tree, candidate, compound) {
                    break;
                }
            }
        }
        true
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn compound_matches(tree: &RenderTree, id: NodeId, compound: &Compound) -> bool {
    let Some(NodeKind::Element { name, attributes }) = tree.kind(id) else {
        return false;
    };
    let attribute = |key: &str| {
        attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| v.as_deref())
    };
    compound.0.iter().all(|simple| match simple {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(t) => name.eq_ignore_ascii_case(t),
        SimpleSelector::Id(want) => attribute("id") == Some(want.as_str()),
        SimpleSelector::Class(want) => attribute("class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == want)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_match_text(tree: &RenderTree, selector: &str) -> Option<String> {
        let selector = Selector::parse(selector).expect("valid selector");
        let id = tree.query_selector(&selector)?;
        let span = tree.char_span(id)?;
        Some(tree.text().chars().skip(span.start).take(span.len()).collect())
    }

    #[test]
    fn parses_compounds_and_descendants() {
        let selector = Selector::parse("strong.t em").expect("valid");
        assert_eq!(
            selector.compounds,
            vec![
                Compound(vec![
                    SimpleSelector::Type("strong".into()),
                    SimpleSelector::Class("t".into())
                ]),
                Compound(vec![SimpleSelector::Type("em".into())]),
            ]
        );
    }

    #[test]
    fn rejects_empty_and_unsupported_syntax() {
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
        assert!(matches!(
            Selector::parse("a > b"),
            Err(SelectorError::Unsupported(_))
        ));
        assert!(matches!(
            Selector::parse("[href]"),
            Err(SelectorError::Unsupported(_))
        ));
        assert!(matches!(
            Selector::parse("a."),
            Err(SelectorError::Unsupported(_))
        ));
        for raw in ["strongé", "ü", "em.é", "#ü"] {
            assert!(
                matches!(Selector::parse(raw), Err(SelectorError::Unsupported(_))),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn matches_type_class_id_and_universal() {
        let tree = RenderTree::from_markup(
            "a<strong class='t big' id='s'>b<em>c</em></strong><i>d</i>",
        );
        assert_eq!(first_match_text(&tree, "strong").as_deref(), Some("bc"));
        assert_eq!(first_match_text(&tree, ".big").as_deref(), Some("bc"));
        assert_eq!(first_match_text(&tree, "#s").as_deref(), Some("bc"));
        assert_eq!(first_match_text(&tree, "strong.t#s").as_deref(), Some("bc"));
        assert_eq!(first_match_text(&tree, "*").as_deref(), Some("bc"));
        assert_eq!(first_match_text(&tree, "EM").as_deref(), Some("c"));
        assert_eq!(first_match_text(&tree, ".missing"), None);
    }

    #[test]
    fn descendant_combinator_requires_ancestor() {
        let tree = RenderTree::from_markup("<em>x</em><strong><em>y</em></strong>");
        assert_eq!(first_match_text(&tree, "strong em").as_deref(), Some("y"));
        assert_eq!(first_match_text(&tree, "i em"), None);
    }
}
