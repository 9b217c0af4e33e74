use core_types::SurfaceKind;
use markup::{Ancestor, TypedUnit, string_to_units};

use crate::tree::{NodeId, RenderTree};

/// The surface an instance types into.
///
/// Cursor positions are counted from the end of the character stream: `0` is after the last
/// character, `char_count()` is before the first.
pub trait RenderTarget {
    fn kind(&self) -> SurfaceKind;

    /// Existing content, serialized the way it would be typed back in.
    fn current_markup(&self) -> String;

    /// Replace all content.
    fn write(&mut self, content: &str);

    fn insert_at(&mut self, unit: &TypedUnit, cursor: usize);

    /// Remove the character immediately left of `cursor`.
    fn remove_before(&mut self, cursor: usize) -> Option<char>;

    fn char_count(&self) -> usize;

    fn text(&self) -> String;

    /// The render tree, for surfaces that keep one.
    fn tree(&self) -> Option<&RenderTree> {
        None
    }

    fn append(&mut self, unit: &TypedUnit) {
        self.insert_at(unit, 0);
    }

    fn remove_last(&mut self) -> Option<char> {
        self.remove_before(0)
    }

    fn query_ancestor_chain(&self, chain: &[Ancestor]) -> Option<NodeId> {
        self.tree().and_then(|tree| tree.query_ancestor_chain(chain))
    }

    fn is_empty(&self) -> bool {
        self.char_count() == 0
    }
}

/// A container of nested inline elements.
#[derive(Clone, Debug)]
pub struct Container {
    tree: RenderTree,
    html: bool,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    pub fn new() -> Self {
        Self {
            tree: RenderTree::new(),
            html: true,
        }
    }

    /// A container whose `write` treats markup as literal text.
    pub fn plain() -> Self {
        Self {
            tree: RenderTree::new(),
            html: false,
        }
    }

    pub fn with_content(content: &str) -> Self {
        let mut container = Self::new();
        container.write(content);
        container
    }

    pub fn tree_mut(&mut self) -> &mut RenderTree {
        &mut self.tree
    }

    fn index_for(&self, cursor: usize) -> usize {
        self.tree.char_count().saturating_sub(cursor)
    }
}

impl RenderTarget for Container {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Container
    }

    fn current_markup(&self) -> String {
        self.tree.to_markup()
    }

    fn write(&mut self, content: &str) {
        self.tree.clear();
        for unit in string_to_units(content, self.html) {
            self.tree.append_unit(&unit);
        }
    }

    fn insert_at(&mut self, unit: &TypedUnit, cursor: usize) {
        if cursor == 0 {
            self.tree.append_unit(unit);
            return;
        }
        let index = self.index_for(cursor);
        match self.tree.char_leaf_at(index) {
            Some(before) => {
                self.tree.insert_unit_before(unit, before);
            }
            None => {
                self.tree.append_unit(unit);
            }
        }
    }

    fn remove_before(&mut self, cursor: usize) -> Option<char> {
        if cursor == 0 {
            return self.tree.remove_last_char();
        }
        let index = self.index_for(cursor);
        let leaf = self.tree.char_leaf_at(index.checked_sub(1)?)?;
        self.tree.remove_char(leaf)
    }

    fn char_count(&self) -> usize {
        self.tree.char_count()
    }

    fn text(&self) -> String {
        self.tree.text()
    }

    fn tree(&self) -> Option<&RenderTree> {
        Some(&self.tree)
    }
}

/// A flat text field. Ancestor chains are ignored; only characters are written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputField {
    value: Vec<char>,
}

impl InputField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.chars().collect(),
        }
    }

    pub fn value(&self) -> String {
        self.value.iter().collect()
    }
}

impl RenderTarget for InputField {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Input
    }

    fn current_markup(&self) -> String {
        self.value()
    }

    fn write(&mut self, content: &str) {
        self.value = content.chars().collect();
    }

    fn insert_at(&mut self, unit: &TypedUnit, cursor: usize) {
        let index = self.value.len().saturating_sub(cursor);
        self.value.insert(index, unit.content());
    }

    fn remove_before(&mut self, cursor: usize) -> Option<char> {
        let index = self.value.len().saturating_sub(cursor).checked_sub(1)?;
        Some(self.value.remove(index))
    }

    fn char_count(&self) -> usize {
        self.value.len()
    }

    fn text(&self) -> String {
        self.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markup::markup_to_units;

    #[test]
    fn container_appends_and_removes_at_the_end() {
        let mut target = Container::new();
        for unit in markup_to_units("ab<b>c</b>") {
            target.append(&unit);
        }
        assert_eq!(target.current_markup(), "ab<b>c</b>");
        assert_eq!(target.remove_last(), Some('c'));
        assert_eq!(target.current_markup(), "ab");
        assert_eq!(target.char_count(), 2);
    }

    #[test]
    fn container_inserts_left_of_the_cursor() {
        let mut target = Container::with_content("<b>ad</b>");
        target.insert_at(&TypedUnit::Plain('c'), 1);
        target.insert_at(&TypedUnit::Plain('b'), 2);
        assert_eq!(target.text(), "abcd");
        assert_eq!(target.current_markup(), "<b>abcd</b>");
    }

    #[test]
    fn container_removes_left_of_the_cursor() {
        let mut target = Container::with_content("ab<i>c</i>d");
        assert_eq!(target.remove_before(1), Some('c'));
        assert_eq!(target.current_markup(), "abd");
        assert_eq!(target.remove_before(3), None);
        assert_eq!(target.remove_before(2), Some('a'));
        assert_eq!(target.text(), "bd");
    }

    #[test]
    fn plain_container_writes_markup_as_text() {
        let mut target = Container::plain();
        target.write("<b>x</b>");
        assert_eq!(target.char_count(), 8);
        assert_eq!(target.current_markup(), "&lt;b&gt;x&lt;/b&gt;");
    }

    #[test]
    fn container_answers_ancestor_chain_queries() {
        let target = Container::with_content("x<em>y</em>");
        assert!(target.query_ancestor_chain(&[Ancestor::new("em")]).is_some());
        assert!(target.query_ancestor_chain(&[Ancestor::new("b")]).is_none());
    }

    #[test]
    fn input_field_writes_only_characters() {
        let mut field = InputField::with_value("ac");
        for unit in markup_to_units("<b>b</b>") {
            field.insert_at(&unit, 1);
        }
        assert_eq!(field.value(), "abc");
        assert_eq!(field.kind(), SurfaceKind::Input);
        assert!(field.tree().is_none());
        assert!(field.query_ancestor_chain(&[Ancestor::new("b")]).is_none());
        assert_eq!(field.remove_before(5), None);
        assert_eq!(field.remove_last(), Some('c'));
        assert_eq!(field.remove_before(1), Some('a'));
        assert_eq!(field.value(), "b");
    }
}
