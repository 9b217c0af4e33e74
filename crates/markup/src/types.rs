use std::sync::Arc;

pub type Attributes = Vec<(String, Option<String>)>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attributes: Attributes,
        self_closing: bool,
    },
    EndTag(String),
    Text(String),
}

/// One enclosing inline element of a typed character.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ancestor {
    pub tag: String,
    pub attributes: Attributes,
}

impl Ancestor {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), Some(value.into())));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_deref())
    }

    /// Same tag (ASCII case-insensitive) and identical attribute list.
    pub fn same_wrapper(&self, tag: &str, attributes: &[(String, Option<String>)]) -> bool {
        self.tag.eq_ignore_ascii_case(tag) && self.attributes == attributes
    }
}

/// A single typed character.
///
/// `Structured` characters carry their ancestor chain ordered innermost first; the chain is
/// shared between all characters of the same run and never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypedUnit {
    Plain(char),
    Structured {
        content: char,
        ancestors: Arc<[Ancestor]>,
    },
}

impl TypedUnit {
    pub fn content(&self) -> char {
        match self {
            TypedUnit::Plain(c) => *c,
            TypedUnit::Structured { content, .. } => *content,
        }
    }

    /// Innermost first; empty for plain characters.
    pub fn ancestors(&self) -> &[Ancestor] {
        match self {
            TypedUnit::Plain(_) => &[],
            TypedUnit::Structured { ancestors, .. } => ancestors,
        }
    }

    /// Attributes of the innermost enclosing element.
    pub fn attributes(&self) -> &[(String, Option<String>)] {
        self.ancestors()
            .first()
            .map(|a| a.attributes.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_line_break(&self) -> bool {
        self.content() == '\n'
    }
}

impl From<char> for TypedUnit {
    fn from(c: char) -> Self {
        TypedUnit::Plain(c)
    }
}
