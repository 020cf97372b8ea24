//! Merging stored comments back into freshly serialized YAML.
//!
//! The serializer output carries no comments. [`CommentDumper`] scans it one
//! line at a time, rebuilds the key structure as it goes and looks every key
//! up in the comment tree loaded earlier. Block comments are written above
//! the line that opens their key, re-indented to the key's new column; side
//! comments are appended to the line.

use std::collections::HashSet;

use tracing::trace;

use crate::key_tree::{KeyTree, NodeId};
use crate::options::CommentType;
use crate::scanner::{Indicator, LineKind, LineScanner};

/// Merge the comments of `tree` into `serialized`.
#[tracing::instrument(skip_all, fields(bytes = serialized.len()))]
pub fn dump(serialized: &str, tree: &KeyTree) -> String {
    let mut out = String::with_capacity(serialized.len() * 2);
    let mut dumper = CommentDumper::new(tree);
    dumper.begin(&mut out);
    for line in serialized.lines() {
        dumper.line(line, &mut out);
    }
    dumper.finish(&mut out);
    out
}

/// Line-by-line comment merger.
///
/// Call [`begin`](Self::begin) once, [`line`](Self::line) for every
/// serialized line in order and [`finish`](Self::finish) at the end.
pub struct CommentDumper<'t> {
    comments: &'t KeyTree,
    scanner: LineScanner,
    /// Key structure of the serialized output seen so far.
    shape: KeyTree,
    cursor: NodeId,
    number: usize,
    /// Side comment waiting for a multi-line quoted value to close.
    after_quote: Option<NodeId>,
    /// Side comment of an explicit key, written after its `: ` line.
    after_explicit: Option<NodeId>,
    /// Comment nodes already written.
    emitted: HashSet<NodeId>,
}

impl<'t> CommentDumper<'t> {
    pub fn new(comments: &'t KeyTree) -> Self {
        let shape = KeyTree::new(comments.separator());
        let cursor = shape.root();
        Self {
            comments,
            scanner: LineScanner::new(),
            shape,
            cursor,
            number: 0,
            after_quote: None,
            after_explicit: None,
            emitted: HashSet::new(),
        }
    }

    /// Write the header followed by a blank line.
    pub fn begin(&mut self, out: &mut String) {
        if let Some(header) = self.comments.header() {
            push_lines(out, header);
            out.push('\n');
        }
    }

    /// Write one serialized line with the comments that belong to it.
    pub fn line(&mut self, text: &str, out: &mut String) {
        self.number += 1;
        let line = self.scanner.scan(self.number, text);

        match line.kind {
            LineKind::Content => {
                let opened = self.shape.attach(self.cursor, &line);
                if let Some(&last) = opened.last() {
                    self.cursor = last;
                }
                let mut side = None;
                for &id in &opened {
                    let Some(found) = self.comments.find_matching(&self.shape, id, &self.emitted)
                    else {
                        trace!(path = %self.shape.path(id), "no comments");
                        continue;
                    };
                    if !self.emitted.insert(found) {
                        continue;
                    }
                    self.block_comment(id, found, out);
                    if Some(&id) == opened.last() {
                        side = Some(found);
                    }
                }
                out.push_str(text);

                match line.indicator() {
                    Some(Indicator::ExplicitKey) => self.after_explicit = side,
                    Some(Indicator::ExplicitValue) => {
                        if let Some(found) = self.after_explicit.take() {
                            self.side_comment(found, text, out);
                        }
                    }
                    _ if line.open_quote => self.after_quote = side,
                    _ => {
                        if let Some(found) = side {
                            self.side_comment(found, text, out);
                        }
                    }
                }
            }
            LineKind::Continuation if line.closes_quote => {
                out.push_str(text);
                if let Some(found) = self.after_quote.take() {
                    self.side_comment(found, text, out);
                }
            }
            _ => out.push_str(text),
        }
        out.push('\n');
    }

    /// Write the footer.
    pub fn finish(mut self, out: &mut String) {
        self.scanner.finish();
        if let Some(footer) = self.comments.footer_comment() {
            push_lines(out, footer);
        }
    }

    fn block_comment(&self, id: NodeId, found: NodeId, out: &mut String) {
        let node = self.comments.node(found);
        let Some(raw) = node.comment(CommentType::Block) else {
            return;
        };
        let from = node.indentation();
        let to = self.shape.node(id).indentation();
        for line in raw.split('\n') {
            push_reindented(out, line, from, to);
            out.push('\n');
        }
    }

    fn side_comment(&self, found: NodeId, text: &str, out: &mut String) {
        let Some(raw) = self.comments.node(found).comment(CommentType::Side) else {
            return;
        };
        let mut lines = raw.split('\n');
        let Some(first) = lines.next() else {
            return;
        };
        out.push_str(first);
        let column = text.len() + (first.len() - first.trim_start().len());
        for line in lines {
            out.push('\n');
            out.extend(core::iter::repeat_n(' ', column));
            out.push_str(line.trim_start());
        }
    }
}

/// Move a comment line from column `from` to column `to`.
fn push_reindented(out: &mut String, line: &str, from: usize, to: usize) {
    let body = line.trim_start_matches([' ', '\t']);
    if body.is_empty() || from == to {
        out.push_str(line);
        return;
    }
    let indent = line.len() - body.len();
    let extra = indent.saturating_sub(from);
    out.extend(core::iter::repeat_n(' ', to + extra));
    out.push_str(body);
}

fn push_lines(out: &mut String, raw: &str) {
    for line in raw.split('\n') {
        out.push_str(line);
        out.push('\n');
    }
}
