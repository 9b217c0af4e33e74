use markup::{Ancestor, Attributes, TypedUnit, markup_to_units};

use crate::selector::Selector;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element { name: String, attributes: Attributes },
    Char(char),
}

#[derive(Clone, Debug)]
struct RenderNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Live hierarchy of inline wrappers and character leaves.
///
/// Invariants:
/// - The root is always `NodeId::ROOT` and is never removed.
/// - Character leaves have no children; only the root and elements do.
/// - After any deletion, no element is left without a character leaf below it.
/// - `char_count` equals the number of live character leaves.
#[derive(Clone, Debug)]
pub struct RenderTree {
    nodes: Vec<Option<RenderNode>>,
    free: Vec<NodeId>,
    char_count: usize,
}

enum Walk {
    Enter(NodeId),
    Exit(NodeId),
}

impl Default for RenderTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(RenderNode {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            })],
            free: Vec::new(),
            char_count: 0,
        }
    }

    /// Build a tree as if every unit of `markup` had been typed in order.
    pub fn from_markup(markup: &str) -> Self {
        let mut tree = Self::new();
        for unit in markup_to_units(markup) {
            tree.append_unit(&unit);
        }
        tree
    }

    fn node(&self, id: NodeId) -> Option<&RenderNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut RenderNode> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element { .. }))
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn is_empty(&self) -> bool {
        self.children(NodeId::ROOT).is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    fn alloc(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        if matches!(kind, NodeKind::Char(_)) {
            self.char_count += 1;
        }
        let node = Some(RenderNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = node;
                id
            }
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(node);
                id
            }
        }
    }

    fn append_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind, parent);
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        id
    }

    fn insert_child_before(&mut self, parent: NodeId, before: NodeId, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind, parent);
        if let Some(p) = self.node_mut(parent) {
            let at = p
                .children
                .iter()
                .position(|&c| c == before)
                .unwrap_or(p.children.len());
            p.children.insert(at, id);
        }
        id
    }

    fn element_kind(ancestor: &Ancestor) -> NodeKind {
        NodeKind::Element {
            name: ancestor.tag.clone(),
            attributes: ancestor.attributes.clone(),
        }
    }

    fn wrapper_matches(&self, id: NodeId, ancestor: &Ancestor) -> bool {
        match self.kind(id) {
            Some(NodeKind::Element { name, attributes }) => {
                ancestor.same_wrapper(name, attributes)
            }
            _ => false,
        }
    }

    /// Elements reached from the root by repeatedly following the last child, outermost first.
    /// Typing continues inside these and only these.
    pub fn open_path(&self) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = NodeId::ROOT;
        while let Some(&last) = self.children(current).last() {
            if !self.is_element(last) {
                break;
            }
            path.push(last);
            current = last;
        }
        path
    }

    /// Element ancestors of `id`, outermost first, excluding the root.
    pub fn element_path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == NodeId::ROOT {
                break;
            }
            path.push(p);
            current = self.parent(p);
        }
        path.reverse();
        path
    }

    /// How many leading levels of `chain` (innermost first) are already open along `path`.
    fn matched_depth(&self, path: &[NodeId], chain: &[Ancestor]) -> usize {
        chain
            .iter()
            .rev()
            .zip(path)
            .take_while(|(ancestor, id)| self.wrapper_matches(**id, ancestor))
            .count()
    }

    /// The open wrapper a character with `chain` would be typed into, if it already exists.
    pub fn query_ancestor_chain(&self, chain: &[Ancestor]) -> Option<NodeId> {
        if chain.is_empty() {
            return None;
        }
        let open = self.open_path();
        let depth = self.matched_depth(&open, chain);
        (depth == chain.len()).then(|| open[depth - 1])
    }

    /// Type `unit` at the end of the content. Returns the new character leaf.
    pub fn append_unit(&mut self, unit: &TypedUnit) -> NodeId {
        let chain = unit.ancestors();
        if chain.is_empty() {
            return self.append_child(NodeId::ROOT, NodeKind::Char(unit.content()));
        }
        let open = self.open_path();
        let depth = self.matched_depth(&open, chain);
        let mut parent = if depth == 0 {
            NodeId::ROOT
        } else {
            open[depth - 1]
        };
        for ancestor in chain[..chain.len() - depth].iter().rev() {
            parent = self.append_child(parent, Self::element_kind(ancestor));
        }
        self.append_child(parent, NodeKind::Char(unit.content()))
    }

    /// Type `unit` immediately before the character leaf `before`.
    pub fn insert_unit_before(&mut self, unit: &TypedUnit, before: NodeId) -> NodeId {
        let Some(before_parent) = self.parent(before) else {
            return self.append_unit(unit);
        };
        let chain = unit.ancestors();
        if chain.is_empty() {
            return self.insert_child_before(before_parent, before, NodeKind::Char(unit.content()));
        }

        let path = self.element_path(before);
        let depth = self.matched_depth(&path, chain);
        let parent = if depth == 0 {
            NodeId::ROOT
        } else {
            path[depth - 1]
        };
        // The child of `parent` that holds `before`.
        let anchor = path.get(depth).copied().unwrap_or(before);

        let missing = &chain[..chain.len() - depth];
        let Some((outermost, inner)) = missing.split_last() else {
            return self.insert_child_before(parent, anchor, NodeKind::Char(unit.content()));
        };
        let mut wrapper = self.insert_child_before(parent, anchor, Self::element_kind(outermost));
        for ancestor in inner.iter().rev() {
            wrapper = self.append_child(wrapper, Self::element_kind(ancestor));
        }
        self.append_child(wrapper, NodeKind::Char(unit.content()))
    }

    fn walk(&self, mut visit: impl FnMut(Walk) -> bool) {
        let mut stack: Vec<(NodeId, bool)> = vec![(NodeId::ROOT, false)];
        while let Some((id, visited)) = stack.pop() {
            if visited {
                if !visit(Walk::Exit(id)) {
                    return;
                }
                continue;
            }
            if !visit(Walk::Enter(id)) {
                return;
            }
            stack.push((id, true));
            for &child in self.children(id).iter().rev() {
                stack.push((child, false));
            }
        }
    }

    /// Character leaves in document order.
    pub fn char_leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.char_count);
        self.walk(|event| {
            if let Walk::Enter(id) = event
                && matches!(self.kind(id), Some(NodeKind::Char(_)))
            {
                out.push(id);
            }
            true
        });
        out
    }

    pub fn char_leaf_at(&self, index: usize) -> Option<NodeId> {
        if index >= self.char_count {
            return None;
        }
        let mut seen = 0usize;
        let mut found = None;
        self.walk(|event| {
            if let Walk::Enter(id) = event
                && matches!(self.kind(id), Some(NodeKind::Char(_)))
            {
                if seen == index {
                    found = Some(id);
                    return false;
                }
                seen += 1;
            }
            true
        });
        found
    }

    pub fn last_char_leaf(&self) -> Option<NodeId> {
        let mut current = NodeId::ROOT;
        loop {
            // Walk backwards through children so stray empty wrappers cannot hide a leaf.
            let next = self.children(current).iter().rev().find_map(|&child| {
                match self.kind(child) {
                    Some(NodeKind::Char(_)) => Some((child, true)),
                    Some(NodeKind::Element { .. }) if self.has_char_below(child) => {
                        Some((child, false))
                    }
                    _ => None,
                }
            });
            match next {
                Some((leaf, true)) => return Some(leaf),
                Some((element, false)) => current = element,
                None => return None,
            }
        }
    }

    fn has_char_below(&self, id: NodeId) -> bool {
        self.children(id).iter().any(|&child| match self.kind(child) {
            Some(NodeKind::Char(_)) => true,
            Some(NodeKind::Element { .. }) => self.has_char_below(child),
            _ => false,
        })
    }

    /// Character range `[start, end)` covered by `id` in document order.
    pub fn char_span(&self, id: NodeId) -> Option<std::ops::Range<usize>> {
        self.node(id)?;
        let mut count = 0usize;
        let mut start = None;
        let mut span = None;
        self.walk(|event| match event {
            Walk::Enter(node) => {
                if node == id {
                    start = Some(count);
                }
                if matches!(self.kind(node), Some(NodeKind::Char(_))) {
                    count += 1;
                }
                true
            }
            Walk::Exit(node) => {
                if node == id {
                    span = start.map(|s| s..count);
                    return false;
                }
                true
            }
        });
        span
    }

    /// Remove a character leaf and prune wrappers it leaves empty. Returns the removed char.
    pub fn remove_char(&mut self, id: NodeId) -> Option<char> {
        let Some(NodeKind::Char(c)) = self.kind(id).cloned() else {
            return None;
        };
        let parent = self.detach(id)?;
        self.char_count -= 1;
        self.prune_empty_from(parent);
        Some(c)
    }

    pub fn remove_last_char(&mut self) -> Option<char> {
        let last = self.last_char_leaf()?;
        self.remove_char(last)
    }

    fn detach(&mut self, id: NodeId) -> Option<NodeId> {
        let node = self.nodes.get_mut(id.index())?.take()?;
        self.free.push(id);
        let parent = node.parent?;
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        Some(parent)
    }

    fn prune_empty_from(&mut self, mut id: NodeId) {
        while id != NodeId::ROOT && self.children(id).is_empty() {
            let Some(parent) = self.detach(id) else {
                return;
            };
            log::trace!(target: "typist.render", "pruned empty wrapper {id:?}");
            id = parent;
        }
    }

    /// Elements matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(|event| {
            if let Walk::Enter(id) = event
                && selector.matches(self, id)
            {
                out.push(id);
            }
            true
        });
        out
    }

    pub fn query_selector(&self, selector: &Selector) -> Option<NodeId> {
        let mut found = None;
        self.walk(|event| {
            if let Walk::Enter(id) = event
                && selector.matches(self, id)
            {
                found = Some(id);
                return false;
            }
            true
        });
        found
    }

    /// Concatenated character leaves.
    pub fn text(&self) -> String {
        self.char_leaves()
            .into_iter()
            .filter_map(|id| match self.kind(id) {
                Some(NodeKind::Char(c)) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Serialize back to inline markup. Line breaks serialize as `<br>`.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.walk(|event| {
            match event {
                Walk::Enter(id) => match self.kind(id) {
                    Some(NodeKind::Element { name, attributes }) => {
                        out.push('<');
                        out.push_str(name);
                        for (k, v) in attributes {
                            out.push(' ');
                            out.push_str(k);
                            if let Some(v) = v {
                                out.push_str("=\"");
                                push_escaped(&mut out, v, true);
                                out.push('"');
                            }
                        }
                        out.push('>');
                    }
                    Some(NodeKind::Char('\n')) => out.push_str("<br>"),
                    Some(NodeKind::Char(c)) => {
                        let mut buf = [0u8; 4];
                        push_escaped(&mut out, c.encode_utf8(&mut buf), false);
                    }
                    _ => {}
                },
                Walk::Exit(id) => {
                    if let Some(NodeKind::Element { name, .. }) = self.kind(id) {
                        out.push_str("</");
                        out.push_str(name);
                        out.push('>');
                    }
                }
            }
            true
        });
        out
    }
}

fn push_escaped(out: &mut String, s: &str, attribute: bool) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
