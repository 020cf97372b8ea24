//! Path syntax shared by the value tree and the comment tree.
//!
//! Segments are joined with a configurable separator. A `\` escapes the next
//! character, so `a\.b` is the single key `a.b` when the separator is `.`.
//! `[N]` after a segment addresses a list element; `N` may be negative to
//! count from the end.

use crate::error::{Error, PathErrorKind, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(isize),
}

impl Segment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(name) => Some(name),
            Self::Index(_) => None,
        }
    }
}

/// Resolve a possibly negative index against a list length.
pub fn resolve_index(index: isize, len: Option<usize>) -> Option<usize> {
    if let Ok(index) = usize::try_from(index) {
        return Some(index);
    }
    let back = index.unsigned_abs();
    len.and_then(|len| len.checked_sub(back))
}

/// Split `path` into segments.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] for empty segments, dangling escapes and
/// malformed `[N]` suffixes.
pub fn parse(path: &str, separator: char) -> Result<Vec<Segment>> {
    let fail = |kind| Error::InvalidPath {
        path: path.to_string(),
        kind,
    };
    if path.is_empty() {
        return Err(fail(PathErrorKind::Empty));
    }

    let mut segments = Vec::new();
    let mut name = String::new();
    // Set after `]` so that `list[0].a` does not see an empty segment.
    let mut after_index = false;
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        if after_index && c != '[' && c != separator {
            return Err(fail(PathErrorKind::TrailingText));
        }
        match c {
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| fail(PathErrorKind::DanglingEscape))?;
                name.push(escaped);
            }
            '[' => {
                if !name.is_empty() {
                    segments.push(Segment::Key(core::mem::take(&mut name)));
                }
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(d) => digits.push(d),
                        None => return Err(fail(PathErrorKind::UnclosedIndex)),
                    }
                }
                let index = digits
                    .trim()
                    .parse::<isize>()
                    .map_err(|_| fail(PathErrorKind::InvalidIndex(digits.clone())))?;
                segments.push(Segment::Index(index));
                after_index = true;
                continue;
            }
            c if c == separator => {
                if name.is_empty() && !after_index {
                    return Err(fail(PathErrorKind::EmptySegment));
                }
                if !name.is_empty() {
                    segments.push(Segment::Key(core::mem::take(&mut name)));
                }
            }
            c => name.push(c),
        }
        after_index = false;
    }

    if !name.is_empty() {
        segments.push(Segment::Key(name));
    } else if !after_index {
        return Err(fail(PathErrorKind::EmptySegment));
    }
    Ok(segments)
}

/// Render segments back into a path string, escaping as needed.
pub fn render(segments: &[Segment], separator: char) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Key(name) => {
                if i > 0 {
                    out.push(separator);
                }
                for c in name.chars() {
                    if c == separator || matches!(c, '\\' | '[' | ']') {
                        out.push('\\');
                    }
                    out.push(c);
                }
            }
            Segment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key(name: &str) -> Segment {
        Segment::Key(name.to_string())
    }

    #[test]
    fn parses_dotted_keys() {
        assert_eq!(
            parse("a.b.c", '.').unwrap(),
            vec![key("a"), key("b"), key("c")]
        );
    }

    #[test]
    fn parses_escaped_separator() {
        assert_eq!(parse(r"a\.b.c", '.').unwrap(), vec![key("a.b"), key("c")]);
    }

    #[test]
    fn parses_list_indices() {
        assert_eq!(
            parse("list[1].name", '.').unwrap(),
            vec![key("list"), Segment::Index(1), key("name")]
        );
        assert_eq!(
            parse("matrix[0][-1]", '.').unwrap(),
            vec![key("matrix"), Segment::Index(0), Segment::Index(-1)]
        );
        assert_eq!(parse("[2]", '.').unwrap(), vec![Segment::Index(2)]);
    }

    #[test]
    fn custom_separator() {
        assert_eq!(parse("a/b.c", '/').unwrap(), vec![key("a"), key("b.c")]);
    }

    #[test]
    fn rejects_malformed_paths() {
        let kind = |p: &str| match parse(p, '.') {
            Err(Error::InvalidPath { kind, .. }) => kind,
            other => panic!("expected error for {p:?}, got {other:?}"),
        };
        assert_eq!(kind(""), PathErrorKind::Empty);
        assert_eq!(kind("a..b"), PathErrorKind::EmptySegment);
        assert_eq!(kind("a."), PathErrorKind::EmptySegment);
        assert_eq!(kind("a\\"), PathErrorKind::DanglingEscape);
        assert_eq!(kind("a[1"), PathErrorKind::UnclosedIndex);
        assert_eq!(kind("a[x]"), PathErrorKind::InvalidIndex("x".into()));
        assert_eq!(kind("a[1]b"), PathErrorKind::TrailingText);
    }

    #[test]
    fn render_escapes_special_characters() {
        let segments = vec![key("a.b"), key("list"), Segment::Index(-1), key("[x]")];
        let rendered = render(&segments, '.');
        assert_eq!(rendered, r"a\.b.list[-1].\[x\]");
        assert_eq!(parse(&rendered, '.').unwrap(), segments);
    }

    #[test]
    fn resolves_negative_indices() {
        assert_eq!(resolve_index(1, None), Some(1));
        assert_eq!(resolve_index(-1, Some(3)), Some(2));
        assert_eq!(resolve_index(-3, Some(3)), Some(0));
        assert_eq!(resolve_index(-4, Some(3)), None);
        assert_eq!(resolve_index(-1, None), None);
    }
}
