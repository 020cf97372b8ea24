//! Reading comments out of YAML text into a [`KeyTree`].

use tracing::{debug, trace};

use crate::key_tree::{KeyTree, NodeId};
use crate::options::CommentType;
use crate::scanner::{Indicator, Line, LineKind, Scanner};

/// Build the comment tree of `text`.
///
/// Values are not interpreted; only the position of keys, sequence entries
/// and comments matters.
#[tracing::instrument(skip_all, fields(bytes = text.len()))]
pub fn parse(text: &str, separator: char) -> KeyTree {
    let lines: Vec<Line<'_>> = Scanner::new(text).collect();
    let mut parser = CommentParser::new(separator);
    for (index, line) in lines.iter().enumerate() {
        parser.line(line, &lines[index + 1..]);
    }
    parser.finish()
}

/// Side comment that following comment lines at the same column continue.
#[derive(Clone, Copy)]
struct SideAnchor {
    node: NodeId,
    column: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ExplicitPart {
    Key,
    Value,
}

#[derive(Clone, Copy)]
struct Explicit {
    node: NodeId,
    column: usize,
    part: ExplicitPart,
}

struct CommentParser<'a> {
    tree: KeyTree,
    /// Innermost node opened so far.
    cursor: NodeId,
    /// Blank and comment lines not yet given to a node.
    pending: Vec<&'a str>,
    /// No content line seen yet.
    before_content: bool,
    side: Option<SideAnchor>,
    /// Node whose quoted value spans several lines.
    open_quote: Option<NodeId>,
    explicit: Option<Explicit>,
    block_keep: bool,
}

impl<'a> CommentParser<'a> {
    fn new(separator: char) -> Self {
        let tree = KeyTree::new(separator);
        let cursor = tree.root();
        Self {
            tree,
            cursor,
            pending: Vec::new(),
            before_content: true,
            side: None,
            open_quote: None,
            explicit: None,
            block_keep: false,
        }
    }

    fn line(&mut self, line: &Line<'a>, rest: &[Line<'a>]) {
        match line.kind {
            LineKind::Blank if line.in_block && self.blank_in_block(rest) => {}
            LineKind::Blank => {
                self.side = None;
                match self.explicit {
                    Some(Explicit {
                        node,
                        part: ExplicitPart::Key,
                        ..
                    }) => self.tree.append_comment(node, CommentType::Block, line.text),
                    _ => self.pending.push(line.text),
                }
            }
            LineKind::Comment => self.comment_line(line),
            LineKind::BlockScalar => self.side = None,
            LineKind::Continuation => {
                self.side = None;
                if line.closes_quote {
                    if let Some(owner) = self.open_quote.take() {
                        self.side_comment(owner, line);
                    }
                }
            }
            LineKind::Content => self.content_line(line),
        }
    }

    /// A blank line inside a block scalar is part of the value when more
    /// block lines follow, or when the block keeps trailing blank lines.
    fn blank_in_block(&self, rest: &[Line<'a>]) -> bool {
        match rest.iter().find(|l| !l.is_blank()) {
            Some(next) if next.kind == LineKind::BlockScalar => true,
            _ => self.block_keep,
        }
    }

    fn comment_line(&mut self, line: &Line<'a>) {
        let column = line.comment.unwrap_or(line.indent);
        if let Some(anchor) = self.side.filter(|a| a.column == column) {
            trace!(line = line.number, "side comment continues");
            self.tree
                .append_comment(anchor.node, CommentType::Side, line.text.trim_start());
            return;
        }
        self.side = None;

        match self.explicit {
            Some(Explicit {
                node,
                part: ExplicitPart::Key,
                ..
            }) => self.tree.append_comment(node, CommentType::Block, line.text),
            Some(Explicit {
                node,
                column: key_column,
                part: ExplicitPart::Value,
            }) if line.indent > key_column => {
                self.tree
                    .append_comment(node, CommentType::Side, line.text.trim_start());
            }
            _ => {
                self.explicit = None;
                self.pending.push(line.text);
            }
        }
    }

    fn content_line(&mut self, line: &Line<'a>) {
        self.side = None;
        let opened = self.tree.attach(self.cursor, line);

        if line.indicator() == Some(Indicator::ExplicitValue) {
            if let Some(explicit) = self.explicit.as_mut() {
                explicit.part = ExplicitPart::Value;
                let node = explicit.node;
                for raw in core::mem::take(&mut self.pending) {
                    self.tree.append_comment(node, CommentType::Block, raw);
                }
                self.side_comment(node, line);
            }
            if let Some(&last) = opened.last() {
                self.cursor = last;
            }
            return;
        }

        let (Some(&first), Some(&last)) = (opened.first(), opened.last()) else {
            // Plain scalar continued from an earlier line.
            if self.cursor != self.tree.root() {
                self.side_comment(self.cursor, line);
            }
            return;
        };
        self.cursor = last;
        self.explicit = None;
        self.flush_pending(first);

        if line.indicator() == Some(Indicator::ExplicitKey) {
            let column = line.markers.first().map_or(line.indent, |m| m.column);
            self.explicit = Some(Explicit {
                node: first,
                column,
                part: ExplicitPart::Key,
            });
            if let Some(at) = line.comment {
                let raw = format!("{}{}", " ".repeat(column), &line.text[at..]);
                self.tree.append_comment(first, CommentType::Block, &raw);
            }
        } else {
            self.side_comment(last, line);
        }

        if line.open_quote {
            self.open_quote = Some(last);
        }
        if let Some(block) = line.block {
            self.block_keep = block.keep;
        }
    }

    fn side_comment(&mut self, node: NodeId, line: &Line<'a>) {
        let (Some(raw), Some(column)) = (line.side_comment(), line.comment) else {
            return;
        };
        self.tree.append_comment(node, CommentType::Side, raw);
        self.side = Some(SideAnchor { node, column });
    }

    /// Give the pending lines to `node`, splitting off the header first if
    /// this is the first content line.
    fn flush_pending(&mut self, node: NodeId) {
        let mut lines = core::mem::take(&mut self.pending);
        if core::mem::replace(&mut self.before_content, false) {
            if let Some(split) = header_split(&lines) {
                self.tree.set_header(Some(lines[..split].join("\n")));
                lines.drain(..=split);
            }
        }
        if !lines.is_empty() {
            self.tree
                .set_comment(node, CommentType::Block, Some(lines.join("\n")));
        }
    }

    fn finish(mut self) -> KeyTree {
        let mut lines = core::mem::take(&mut self.pending);
        if self.before_content {
            if let Some(split) = header_split(&lines) {
                self.tree.set_header(Some(lines[..split].join("\n")));
                lines.drain(..=split);
            }
        }
        if !lines.is_empty() {
            self.tree.set_footer(Some(lines.join("\n")));
        }
        debug!(
            header = self.tree.header().is_some(),
            footer = self.tree.footer().is_some(),
            "parsed comments"
        );
        self.tree
    }
}

/// Index of the blank line ending the header: the first blank line after
/// the first comment line.
fn header_split(lines: &[&str]) -> Option<usize> {
    let first_comment = lines.iter().position(|l| !l.trim().is_empty())?;
    lines[first_comment..]
        .iter()
        .position(|l| l.trim().is_empty())
        .map(|offset| first_comment + offset)
}
