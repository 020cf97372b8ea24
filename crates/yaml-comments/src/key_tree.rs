//! Tree of document keys carrying the comments found around them.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Each node
//! stores its comments exactly as they appeared on disk, together with the
//! column it was found at, so that unchanged documents are reproduced
//! byte for byte.

use alloc::collections::BTreeMap;
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::options::CommentType;
use crate::path::{self, Segment};
use crate::scanner::{Indicator, Line, unquote};
use crate::values::ValueShape;

/// Index of a node in its [`KeyTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    /// Mapping key.
    Key(String),
    /// Sequence element. `text` holds the scalar written on the entry line,
    /// if any.
    Element { index: usize, text: Option<String> },
    /// Holder for the comment lines after the last value.
    Footer,
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    indentation: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// First child for each name. Sequence elements are listed under their
    /// scalar text.
    name_index: HashMap<String, NodeId>,
    /// Children created through the comment API.
    priority_index: HashMap<String, NodeId>,
    element_index: BTreeMap<usize, NodeId>,
    list_size: Option<usize>,
    comment: Option<String>,
    side_comment: Option<String>,
}

impl Node {
    fn new(kind: NodeKind, indentation: usize, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            indentation,
            parent,
            children: Vec::new(),
            name_index: HashMap::new(),
            priority_index: HashMap::new(),
            element_index: BTreeMap::new(),
            list_size: None,
            comment: None,
            side_comment: None,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Key name, or the scalar text of a sequence element.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Key(name) => Some(name),
            NodeKind::Element { text, .. } => text.as_deref(),
            NodeKind::Root | NodeKind::Footer => None,
        }
    }

    /// Column the node was found at (or will be written at).
    pub fn indentation(&self) -> usize {
        self.indentation
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_list(&self) -> bool {
        self.list_size.is_some()
    }

    pub fn list_size(&self) -> Option<usize> {
        self.list_size
    }

    /// Raw comment lines as stored on disk.
    pub fn comment(&self, kind: CommentType) -> Option<&str> {
        match kind {
            CommentType::Block => self.comment.as_deref(),
            CommentType::Side => self.side_comment.as_deref(),
        }
    }

    /// Scalar text of a sequence element.
    fn element_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { text, .. } => text.as_deref(),
            _ => None,
        }
    }

    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.comment.is_none() && self.side_comment.is_none()
    }
}

/// Comment tree of one document.
///
/// Removing a node frees its slot and the slots of its descendants for reuse,
/// so a [`NodeId`] must not be kept across a [`prune`](Self::prune).
#[derive(Debug, Clone)]
pub struct KeyTree {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    separator: char,
    header: Option<String>,
}

impl KeyTree {
    const ROOT: NodeId = NodeId(0);

    pub fn new(separator: char) -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Root, 0, None)],
            free: Vec::new(),
            separator,
            header: None,
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Raw header lines.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn set_header(&mut self, raw: Option<String>) {
        self.header = raw;
    }

    pub fn footer(&self) -> Option<NodeId> {
        self.node(Self::ROOT)
            .children
            .iter()
            .copied()
            .find(|&id| self.node(id).kind == NodeKind::Footer)
    }

    /// Raw footer lines.
    pub fn footer_comment(&self) -> Option<&str> {
        self.footer()
            .and_then(|id| self.node(id).comment(CommentType::Block))
    }

    pub fn set_footer(&mut self, raw: Option<String>) {
        match (self.footer(), raw) {
            (Some(id), raw @ Some(_)) => self.node_mut(id).comment = raw,
            (Some(id), None) => self.detach(id),
            (None, raw @ Some(_)) => {
                let id = self.push(NodeKind::Footer, 0, Self::ROOT);
                self.node_mut(id).comment = raw;
            }
            (None, None) => {}
        }
    }

    pub fn set_comment(&mut self, id: NodeId, kind: CommentType, raw: Option<String>) {
        let node = self.node_mut(id);
        match kind {
            CommentType::Block => node.comment = raw,
            CommentType::Side => node.side_comment = raw,
        }
    }

    /// Add a raw line below the existing comment of `kind`.
    pub(crate) fn append_comment(&mut self, id: NodeId, kind: CommentType, raw: &str) {
        let node = self.node_mut(id);
        let slot = match kind {
            CommentType::Block => &mut node.comment,
            CommentType::Side => &mut node.side_comment,
        };
        match slot {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(raw);
            }
            None => *slot = Some(raw.to_string()),
        }
    }

    fn push(&mut self, kind: NodeKind, indentation: usize, parent: NodeId) -> NodeId {
        let node = Node::new(kind, indentation, Some(parent));
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        };
        self.node_mut(parent).children.push(id);
        id
    }

    pub fn add_key(&mut self, parent: NodeId, name: String, indentation: usize) -> NodeId {
        let id = self.push(NodeKind::Key(name.clone()), indentation, parent);
        self.node_mut(parent).name_index.entry(name).or_insert(id);
        id
    }

    /// Append an element after the last one seen under `parent`.
    pub fn add_element(&mut self, parent: NodeId, indentation: usize) -> NodeId {
        let index = self
            .node(parent)
            .element_index
            .keys()
            .next_back()
            .map_or(0, |last| last + 1);
        self.add_element_at(parent, index, indentation)
    }

    fn add_element_at(&mut self, parent: NodeId, index: usize, indentation: usize) -> NodeId {
        let id = self.push(NodeKind::Element { index, text: None }, indentation, parent);
        let node = self.node_mut(parent);
        node.element_index.insert(index, id);
        node.list_size = Some(node.list_size.unwrap_or(0).max(index + 1));
        id
    }

    fn set_element_text(&mut self, id: NodeId, value: &str) {
        self.replace_element_text(id, Some(unquote(value)));
    }

    /// Record the scalar now stored in element `id`, or `None` if it holds
    /// a collection.
    pub(crate) fn replace_element_text(&mut self, id: NodeId, text: Option<String>) {
        let NodeKind::Element { text: slot, .. } = &mut self.node_mut(id).kind else {
            return;
        };
        let old = core::mem::replace(slot, text.clone());
        let Some(parent) = self.node(id).parent else {
            return;
        };
        if let Some(old) = old {
            self.unindex_name(parent, id, &old);
        }
        if let Some(text) = text {
            self.node_mut(parent).name_index.entry(text).or_insert(id);
        }
    }

    /// Find the node a line starting at `column` belongs under, walking up
    /// from `from`.
    ///
    /// A sequence entry may sit at the same column as the key owning the
    /// sequence.
    pub fn find_parent(&self, from: NodeId, column: usize, entry: bool) -> NodeId {
        let mut id = from;
        loop {
            let node = self.node(id);
            let owns = match node.kind {
                NodeKind::Root => true,
                NodeKind::Footer => false,
                NodeKind::Key(_) => {
                    node.indentation < column || (entry && node.indentation == column)
                }
                NodeKind::Element { .. } => node.indentation < column,
            };
            if owns {
                return id;
            }
            match node.parent {
                Some(parent) => id = parent,
                None => return Self::ROOT,
            }
        }
    }

    /// Open the nodes introduced by a content line, outermost first.
    ///
    /// `cursor` is the innermost node opened by an earlier line.
    pub(crate) fn attach(&mut self, cursor: NodeId, line: &Line<'_>) -> Vec<NodeId> {
        let mut from = cursor;
        let mut opened = Vec::new();
        for marker in &line.markers {
            match marker.indicator {
                Indicator::Entry => {
                    let parent = self.find_parent(from, marker.column, true);
                    let id = self.add_element(parent, marker.column);
                    opened.push(id);
                    from = id;
                }
                Indicator::ExplicitKey => {
                    let parent = self.find_parent(from, marker.column, false);
                    let end = line.value_end().max(line.content_column);
                    let name = unquote(line.text[line.content_column..end].trim());
                    opened.push(self.add_key(parent, name, marker.column));
                    return opened;
                }
                Indicator::ExplicitValue => {}
            }
        }
        if let Some(key) = &line.key {
            let parent = self.find_parent(from, key.column, false);
            opened.push(self.add_key(parent, key.name.clone(), key.column));
        } else if let (Some(value), Some(&last)) = (line.value, opened.last()) {
            if !line.is_multiline() {
                self.set_element_text(last, value);
            }
        }
        opened
    }

    /// Child of `parent` named `name`. With `priority`, nodes created through
    /// the comment API win over nodes found in the document.
    pub fn child(&self, parent: NodeId, name: &str, priority: bool) -> Option<NodeId> {
        let node = self.node(parent);
        priority
            .then(|| node.priority_index.get(name))
            .flatten()
            .or_else(|| node.name_index.get(name))
            .copied()
    }

    pub fn element(&self, parent: NodeId, index: isize) -> Option<NodeId> {
        let node = self.node(parent);
        let index = path::resolve_index(index, node.list_size)?;
        node.element_index.get(&index).copied()
    }

    pub fn lookup(&self, segments: &[Segment], priority: bool) -> Option<NodeId> {
        segments.iter().try_fold(Self::ROOT, |id, segment| match segment {
            Segment::Key(name) => self.child(id, name, priority),
            Segment::Index(index) => self.element(id, *index),
        })
    }

    /// Like [`lookup`](Self::lookup) through the comment API, with negative
    /// indices counted from the end of the sequences in `values`.
    pub fn resolve(&self, segments: &[Segment], values: &dyn ValueShape) -> Option<NodeId> {
        let mut id = Self::ROOT;
        for (depth, segment) in segments.iter().enumerate() {
            id = match segment {
                Segment::Key(name) => self.child(id, name, true)?,
                Segment::Index(index) => {
                    let len = values
                        .sequence_len(&segments[..depth])
                        .or(self.node(id).list_size);
                    let index = path::resolve_index(*index, len)?;
                    self.node(id).element_index.get(&index).copied()?
                }
            };
        }
        Some(id)
    }

    /// Find the node for a path string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `path` cannot be parsed.
    pub fn get(&self, path: &str) -> Result<Option<NodeId>> {
        let segments = path::parse(path, self.separator)?;
        Ok(self.lookup(&segments, true))
    }

    /// Find the node at `segments`, creating empty placeholder nodes for the
    /// missing part of the path.
    ///
    /// `values` supplies the length of sequences so that negative indices can
    /// be resolved. New nodes are indented `indent` spaces per mapping level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValuePath`] for a negative index that does not
    /// resolve.
    pub fn get_or_create(
        &mut self,
        segments: &[Segment],
        values: &dyn ValueShape,
        indent: usize,
    ) -> Result<NodeId> {
        let mut id = Self::ROOT;
        for (depth, segment) in segments.iter().enumerate() {
            // Current values decide what a negative index means.
            if let Some(len) = values.sequence_len(&segments[..depth]) {
                self.node_mut(id).list_size = Some(len);
            }
            let next = match segment {
                Segment::Key(name) => self.child(id, name, true),
                Segment::Index(index) => self.element(id, *index),
            };
            id = match (next, segment) {
                (Some(next), _) => next,
                (None, Segment::Key(name)) => {
                    let indentation = self.child_indentation(id, false, indent);
                    let child = self.add_key(id, name.clone(), indentation);
                    self.node_mut(id)
                        .priority_index
                        .entry(name.clone())
                        .or_insert(child);
                    child
                }
                (None, Segment::Index(index)) => {
                    let resolved = path::resolve_index(*index, self.node(id).list_size)
                        .ok_or_else(|| Error::ValuePath {
                            path: path::render(&segments[..=depth], self.separator),
                            reason: "list index out of range".to_string(),
                        })?;
                    let indentation = self.child_indentation(id, true, indent);
                    self.add_element_at(id, resolved, indentation)
                }
            };
        }
        Ok(id)
    }

    /// Column for a node created below `parent`, following the layout the
    /// serializer produces: sequences under a key are not indented and keys
    /// of a mapping inside a sequence start after `- `.
    fn child_indentation(&self, parent: NodeId, element: bool, indent: usize) -> usize {
        let node = self.node(parent);
        match (&node.kind, element) {
            (NodeKind::Root | NodeKind::Footer, _) => 0,
            (NodeKind::Key(_), true) => node.indentation,
            (NodeKind::Key(_), false) => node.indentation + indent,
            (NodeKind::Element { .. }, _) => node.indentation + 2,
        }
    }

    /// Path segments from the root to `id`.
    pub fn segments(&self, id: NodeId) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            match &self.node(current).kind {
                NodeKind::Key(name) => segments.push(Segment::Key(name.clone())),
                NodeKind::Element { index, .. } => {
                    segments.push(Segment::Index(isize::try_from(*index).unwrap_or(isize::MAX)));
                }
                NodeKind::Root | NodeKind::Footer => {}
            }
            current = parent;
        }
        segments.reverse();
        segments
    }

    pub fn path(&self, id: NodeId) -> String {
        path::render(&self.segments(id), self.separator)
    }

    /// Find the node of this tree matching node `id` of `other`, skipping
    /// nodes in `taken`.
    ///
    /// Keys and elements without scalar text are matched by path. A scalar
    /// element keeps the node at its index only while that node was seen
    /// with the same text (or with none); otherwise it goes to the first
    /// free sibling seen with its text.
    pub fn find_matching(
        &self,
        other: &Self,
        id: NodeId,
        taken: &HashSet<NodeId>,
    ) -> Option<NodeId> {
        let segments = other.segments(id);
        let direct = self.lookup(&segments, true);
        let Some(text) = other.node(id).element_text() else {
            return direct;
        };
        if let Some(found) = direct {
            match self.node(found).element_text() {
                None => return Some(found),
                Some(stored) if stored == text && !taken.contains(&found) => return Some(found),
                Some(_) => {}
            }
        }
        let parent = self.lookup(&segments[..segments.len() - 1], true)?;
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|c| !taken.contains(c) && self.node(*c).element_text() == Some(text))
    }

    /// Forget element `index` of `list` and its comments, moving the
    /// elements after it one position down.
    pub fn remove_element(&mut self, list: NodeId, index: usize) {
        if let Some(id) = self.node(list).element_index.get(&index).copied() {
            self.detach(id);
        }
        let node = self.node_mut(list);
        node.list_size = node.list_size.map(|len| len.saturating_sub(1));
        let shifted = node.element_index.split_off(&index);
        for (position, id) in shifted {
            let position = position.saturating_sub(1);
            self.node_mut(list).element_index.insert(position, id);
            if let NodeKind::Element { index: slot, .. } = &mut self.node_mut(id).kind {
                *slot = position;
            }
        }
    }

    /// Remove `id` and then every ancestor left without comments and
    /// children.
    pub fn prune(&mut self, id: NodeId) {
        let mut current = id;
        while current != Self::ROOT && self.node(current).is_empty() {
            let Some(parent) = self.node(current).parent else {
                return;
            };
            self.detach(current);
            current = parent;
        }
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        let name = self.node(id).name().map(str::to_string);
        self.node_mut(id).parent = None;

        let node = self.node_mut(parent);
        node.children.retain(|&c| c != id);
        node.element_index.retain(|_, &mut c| c != id);
        node.priority_index.retain(|_, &mut c| c != id);
        if let Some(name) = name {
            self.unindex_name(parent, id, &name);
        }

        let mut released = vec![id];
        while let Some(next) = released.pop() {
            released.extend(core::mem::take(&mut self.node_mut(next).children));
            self.node_mut(next).parent = None;
            self.free.push(next);
        }
    }

    /// Point `name` of `parent` away from `id`, at the next sibling with the
    /// same name if there is one.
    fn unindex_name(&mut self, parent: NodeId, id: NodeId, name: &str) {
        if self.node(parent).name_index.get(name) != Some(&id) {
            return;
        }
        let replacement = self
            .node(parent)
            .children
            .iter()
            .copied()
            .find(|&s| s != id && self.node(s).name() == Some(name));
        let index = &mut self.node_mut(parent).name_index;
        match replacement {
            Some(other) => index.insert(name.to_string(), other),
            None => index.remove(name),
        };
    }

    /// Nodes in document order, excluding the root.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.node(Self::ROOT).children.iter().rev().copied().collect();
        core::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.node(id).children.iter().rev().copied());
            Some(id)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use serde_yaml::Value;

    fn build(text: &str) -> KeyTree {
        let mut tree = KeyTree::new('.');
        let mut cursor = tree.root();
        for line in Scanner::new(text) {
            if line.kind == crate::scanner::LineKind::Content {
                if let Some(&last) = tree.attach(cursor, &line).last() {
                    cursor = last;
                }
            }
        }
        tree
    }

    fn paths(tree: &KeyTree) -> Vec<String> {
        tree.iter().map(|id| tree.path(id)).collect()
    }

    #[test]
    fn nests_keys_by_indentation() {
        let tree = build("a:\n  b:\n    c: 1\n  d: 2\ne: 3\n");
        assert_eq!(paths(&tree), ["a", "a.b", "a.b.c", "a.d", "e"]);
    }

    #[test]
    fn sequence_at_key_column_belongs_to_key() {
        let tree = build("list:\n- 10\n- 20\nnext: 1\n");
        assert_eq!(paths(&tree), ["list", "list[0]", "list[1]", "next"]);
        let list = tree.get("list").unwrap().unwrap();
        assert_eq!(tree.node(list).list_size(), Some(2));
        assert_eq!(tree.get("list[-1]").unwrap(), tree.get("list[1]").unwrap());
    }

    #[test]
    fn mappings_inside_sequences() {
        let tree = build("items:\n- name: a\n  size: 1\n- name: b\n");
        assert_eq!(
            paths(&tree),
            [
                "items",
                "items[0]",
                "items[0].name",
                "items[0].size",
                "items[1]",
                "items[1].name"
            ]
        );
    }

    #[test]
    fn nested_sequences() {
        let tree = build("- - a\n  - b\n- c\n");
        assert_eq!(paths(&tree), ["[0]", "[0][0]", "[0][1]", "[1]"]);
    }

    #[test]
    fn element_text_is_indexed_by_name() {
        let tree = build("list:\n- alpha\n- 'beta'\n");
        let list = tree.get("list").unwrap().unwrap();
        assert_eq!(tree.child(list, "beta", false), tree.get("list[1]").unwrap());
    }

    #[test]
    fn first_duplicate_name_wins() {
        let tree = build("a: 1\na: 2\n");
        let first = tree.node(tree.root()).children()[0];
        assert_eq!(tree.get("a").unwrap(), Some(first));
    }

    #[test]
    fn creates_placeholders_with_serializer_layout() {
        let mut tree = KeyTree::new('.');
        let segments = path::parse("a.list[0].name", '.').unwrap();
        let id = tree.get_or_create(&segments, &(), 2).unwrap();
        assert_eq!(tree.path(id), "a.list[0].name");
        let columns: Vec<usize> = tree.iter().map(|n| tree.node(n).indentation()).collect();
        assert_eq!(columns, [0, 2, 2, 4]);
    }

    #[test]
    fn negative_index_needs_a_length() {
        let mut tree = KeyTree::new('.');
        let segments = path::parse("list[-1]", '.').unwrap();
        let err = tree.get_or_create(&segments, &(), 2).unwrap_err();
        assert!(matches!(err, Error::ValuePath { .. }));
    }

    #[test]
    fn prune_removes_empty_ancestors() {
        let mut tree = KeyTree::new('.');
        let segments = path::parse("a.b.c", '.').unwrap();
        let id = tree.get_or_create(&segments, &(), 2).unwrap();
        tree.prune(id);
        assert!(tree.iter().next().is_none());
        assert_eq!(tree.get("a").unwrap(), None);
    }

    #[test]
    fn prune_keeps_commented_ancestors() {
        let mut tree = build("a:\n  b: 1\n");
        let a = tree.get("a").unwrap().unwrap();
        tree.set_comment(a, CommentType::Block, Some("# keep".into()));
        let b = tree.get("a.b").unwrap().unwrap();
        tree.prune(b);
        assert_eq!(paths(&tree), ["a"]);
    }

    #[test]
    fn footer_lives_under_root() {
        let mut tree = KeyTree::new('.');
        tree.set_footer(Some("# end".into()));
        assert_eq!(tree.footer_comment(), Some("# end"));
        tree.set_footer(None);
        assert_eq!(tree.footer(), None);
    }

    #[test]
    fn matches_element_by_text_when_index_is_missing() {
        let comments = build("list:\n- a\n");
        let mut shape = KeyTree::new('.');
        let list = shape.add_key(shape.root(), "list".into(), 0);
        let _ = shape.add_element(list, 0);
        let second = shape.add_element(list, 0);
        shape.set_element_text(second, "a");
        let found = comments.find_matching(&shape, second, &HashSet::new());
        assert_eq!(found, comments.get("list[0]").unwrap());
    }

    #[test]
    fn scalar_element_follows_its_text() {
        let comments = build("list:\n- a\n- b\n- c\n");
        let shape = build("list:\n- b\n- c\n");
        let first = shape.get("list[0]").unwrap().unwrap();
        let second = shape.get("list[1]").unwrap().unwrap();

        let mut taken = HashSet::new();
        let found = comments.find_matching(&shape, first, &taken);
        assert_eq!(found, comments.get("list[1]").unwrap());
        taken.insert(found.unwrap());
        assert_eq!(
            comments.find_matching(&shape, second, &taken),
            comments.get("list[2]").unwrap()
        );
    }

    #[test]
    fn repeated_text_goes_to_the_next_free_element() {
        let comments = build("list:\n- a\n- a\n");
        let shape = build("list:\n- x\n- a\n- a\n");
        let mut taken = HashSet::new();
        let ids: Vec<Option<NodeId>> = ["list[0]", "list[1]", "list[2]"]
            .into_iter()
            .map(|path| {
                let found =
                    comments.find_matching(&shape, shape.get(path).unwrap().unwrap(), &taken);
                taken.extend(found);
                found
            })
            .collect();
        assert_eq!(
            ids,
            [
                None,
                comments.get("list[1]").unwrap(),
                comments.get("list[0]").unwrap()
            ]
        );
    }

    #[test]
    fn elements_without_text_match_by_index() {
        let mut comments = KeyTree::new('.');
        let segments = path::parse("list[0]", '.').unwrap();
        let placeholder = comments.get_or_create(&segments, &(), 2).unwrap();
        let shape = build("list:\n- anything\n");
        let element = shape.get("list[0]").unwrap().unwrap();
        assert_eq!(
            comments.find_matching(&shape, element, &HashSet::new()),
            Some(placeholder)
        );
    }

    #[test]
    fn remove_element_shifts_later_elements() {
        let mut tree = build("list:\n- a\n- b\n- c\n");
        let list = tree.get("list").unwrap().unwrap();
        let b = tree.get("list[1]").unwrap().unwrap();
        let c = tree.get("list[2]").unwrap().unwrap();

        tree.remove_element(list, 0);
        assert_eq!(tree.get("list[0]").unwrap(), Some(b));
        assert_eq!(tree.get("list[-1]").unwrap(), Some(c));
        assert_eq!(tree.node(list).list_size(), Some(2));
        assert_eq!(tree.child(list, "a", false), None);
        assert_eq!(paths(&tree), ["list", "list[0]", "list[1]"]);
    }

    #[test]
    fn resolve_counts_negative_indices_from_values() {
        let tree = build("list:\n- 10\n- 20\n");
        let grown: Value = serde_yaml::from_str("list: [10, 20, 30]").unwrap();
        let segments = path::parse("list[-1]", '.').unwrap();
        assert_eq!(tree.resolve(&segments, &grown), None);
        assert_eq!(tree.resolve(&segments, &()), tree.get("list[1]").unwrap());

        let segments = path::parse("list[-2]", '.').unwrap();
        assert_eq!(tree.resolve(&segments, &grown), tree.get("list[1]").unwrap());
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut tree = build("a: 1\n");
        let segments = path::parse("b.c", '.').unwrap();
        let mut sizes = Vec::new();
        for _ in 0..3 {
            let id = tree.get_or_create(&segments, &(), 2).unwrap();
            tree.set_comment(id, CommentType::Block, Some("# note".into()));
            tree.set_comment(id, CommentType::Block, None);
            tree.prune(id);
            sizes.push(tree.nodes.len());
        }
        assert_eq!(sizes, [4, 4, 4]);
        assert_eq!(paths(&tree), ["a"]);
    }
}
