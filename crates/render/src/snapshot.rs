use std::fmt;

use crate::tree::{NodeId, NodeKind, RenderTree};

/// Deterministic indented dump of a render tree for test comparisons.
///
/// Adjacent character leaves collapse into one quoted text line, so a snapshot reads like the
/// markup that produced it rather than one line per character.
#[derive(Debug)]
pub struct TreeSnapshot {
    lines: Vec<String>,
}

impl TreeSnapshot {
    pub fn new(tree: &RenderTree) -> Self {
        let mut lines = vec!["#root".to_string()];
        walk_snapshot(tree, NodeId::ROOT, 1, &mut lines);
        Self { lines }
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for TreeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

const INDENT_STEP: usize = 2;

fn walk_snapshot(tree: &RenderTree, id: NodeId, depth: usize, out: &mut Vec<String>) {
    let indent = " ".repeat(depth * INDENT_STEP);
    let mut run = String::new();
    let flush = |run: &mut String, out: &mut Vec<String>| {
        if !run.is_empty() {
            out.push(format!("{indent}\"{}\"", run.escape_debug()));
            run.clear();
        }
    };
    for &child in tree.children(id) {
        match tree.kind(child) {
            Some(NodeKind::Char(c)) => run.push(*c),
            Some(NodeKind::Element { name, attributes }) => {
                flush(&mut run, out);
                let mut line = format!("{indent}<{name}");
                for (k, v) in attributes {
                    match v {
                        Some(v) => line.push_str(&format!(" {k}=\"{v}\"")),
                        None => line.push_str(&format!(" {k}")),
                    }
                }
                line.push('>');
                out.push(line);
                walk_snapshot(tree, child, depth + 1, out);
            }
            Some(NodeKind::Root) | None => {}
        }
    }
    flush(&mut run, out);
}

/// The rendered text with `cursor_char` placed `cursor` characters from the end.
pub fn text_with_cursor(text: &str, cursor: usize, cursor_char: char) -> String {
    let chars: Vec<char> = text.chars().collect();
    let at = chars.len().saturating_sub(cursor);
    let mut out = String::with_capacity(text.len() + cursor_char.len_utf8());
    out.extend(&chars[..at]);
    out.push(cursor_char);
    out.extend(&chars[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_groups_text_runs_under_elements() {
        let tree = RenderTree::from_markup("Hi, <strong class='t'>Bob! <em>Bye</em></strong>");
        let snapshot = TreeSnapshot::new(&tree);
        assert_eq!(
            snapshot.as_lines(),
            [
                "#root",
                "  \"Hi, \"",
                "  <strong class=\"t\">",
                "    \"Bob! \"",
                "    <em>",
                "      \"Bye\"",
            ]
        );
    }

    #[test]
    fn snapshot_escapes_line_breaks() {
        let tree = RenderTree::from_markup("a<br>b");
        assert_eq!(snapshot_text(&tree), "#root\n  \"a\\nb\"");
    }

    fn snapshot_text(tree: &RenderTree) -> String {
        TreeSnapshot::new(tree).to_string()
    }

    #[test]
    fn cursor_is_placed_from_the_end() {
        assert_eq!(text_with_cursor("abc", 0, '|'), "abc|");
        assert_eq!(text_with_cursor("abc", 2, '|'), "a|bc");
        assert_eq!(text_with_cursor("abc", 9, '|'), "|abc");
    }
}
