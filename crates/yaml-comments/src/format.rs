//! Conversion between the comment text an application works with and the
//! comment lines stored on disk.
//!
//! Both directions are pure functions of their arguments; the format in use
//! is passed on every call.

use crate::options::{CommentFormat, CommentType};

/// Turn comment text into raw comment lines.
///
/// Block comments are indented to `indent`. Side comments are returned
/// without alignment: the first line starts with whitespace so it can be
/// appended to a value, and continuation lines start at their `#`.
///
/// Text where every line is blank or already starts with `#` is kept as is,
/// except that indentation is normalised.
pub fn dump(text: &str, kind: CommentType, indent: usize, format: &CommentFormat) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let commented = lines.iter().all(|line| {
        let line = line.trim_start();
        line.is_empty() || line.starts_with('#')
    });
    let pad = " ".repeat(indent);
    let last = lines.len().saturating_sub(1);

    let mut out = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let rendered = if commented {
            dump_commented_line(line, kind, i, &pad)
        } else {
            let prefix = if i == 0 {
                &format.prefix
            } else {
                &format.prefix_multiline
            };
            let suffix = if i == last {
                &format.suffix
            } else {
                &format.suffix_multiline
            };
            dump_line(line, kind, i, &pad, prefix, suffix)
        };
        out.push(rendered);
    }
    out.join("\n")
}

fn dump_commented_line(line: &str, kind: CommentType, i: usize, pad: &str) -> String {
    let line = line.trim_start();
    match kind {
        CommentType::Block if line.is_empty() => String::new(),
        CommentType::Block => format!("{pad}{line}"),
        CommentType::Side if i == 0 => format!(" {line}"),
        CommentType::Side if line.is_empty() => "#".to_string(),
        CommentType::Side => line.to_string(),
    }
}

fn dump_line(
    line: &str,
    kind: CommentType,
    i: usize,
    pad: &str,
    prefix: &str,
    suffix: &str,
) -> String {
    match kind {
        CommentType::Block if line.trim().is_empty() => String::new(),
        CommentType::Block => format!("{pad}{prefix}{line}{suffix}"),
        CommentType::Side if i == 0 => {
            let lead = if prefix.starts_with([' ', '\t']) {
                ""
            } else {
                " "
            };
            format!("{lead}{prefix}{line}{suffix}").trim_end().to_string()
        }
        CommentType::Side => format!("{}{line}{suffix}", prefix.trim_start())
            .trim_end()
            .to_string(),
    }
}

/// Turn raw comment lines back into comment text.
///
/// Indentation, the configured prefix (or a bare `#`) and suffix are removed
/// from each line. With `trim`, leading and trailing blank lines and trailing
/// spaces are dropped. Returns `None` when nothing is left.
pub fn parse(raw: &str, format: &CommentFormat, trim: bool) -> Option<String> {
    let lines: Vec<&str> = raw.lines().collect();
    let last = lines.len().saturating_sub(1);
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        let line = line.trim_start();
        if line.is_empty() {
            out.push("");
            continue;
        }
        let prefix = if i == 0 {
            &format.prefix
        } else {
            &format.prefix_multiline
        };
        let suffix = if i == last {
            &format.suffix
        } else {
            &format.suffix_multiline
        };
        let mut text = strip_prefix(line, prefix);
        if !suffix.is_empty() {
            text = text
                .strip_suffix(suffix.as_str())
                .or_else(|| text.trim_end().strip_suffix(suffix.trim()))
                .unwrap_or(text);
        }
        out.push(if trim { text.trim_end() } else { text });
    }

    if trim {
        while out.first().is_some_and(|l| l.trim().is_empty()) {
            out.remove(0);
        }
        while out.last().is_some_and(|l| l.trim().is_empty()) {
            out.pop();
        }
    }
    if out.is_empty() {
        return None;
    }
    Some(out.join("\n"))
}

fn strip_prefix<'a>(line: &'a str, prefix: &str) -> &'a str {
    let prefix = prefix.trim_start();
    line.strip_prefix(prefix)
        .or_else(|| line.strip_prefix(prefix.trim_end()))
        .or_else(|| line.strip_prefix('#'))
        .unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dumps_block_comment_with_indent() {
        let raw = dump("first\nsecond", CommentType::Block, 2, &CommentFormat::block());
        assert_eq!(raw, "  # first\n  # second");
    }

    #[test]
    fn blank_lines_stay_blank() {
        let raw = dump("a\n\nb", CommentType::Block, 0, &CommentFormat::block());
        assert_eq!(raw, "# a\n\n# b");
    }

    #[test]
    fn already_commented_text_is_not_prefixed() {
        let raw = dump(
            "# keep\n#   me",
            CommentType::Block,
            4,
            &CommentFormat::block(),
        );
        assert_eq!(raw, "    # keep\n    #   me");
    }

    #[test]
    fn commented_side_comment_gets_leading_space() {
        let raw = dump("#tight", CommentType::Side, 0, &CommentFormat::side());
        assert_eq!(raw, " #tight");
    }

    #[test]
    fn dumps_multiline_side_comment() {
        let raw = dump("one\ntwo", CommentType::Side, 6, &CommentFormat::side());
        assert_eq!(raw, " # one\n# two");
    }

    #[test]
    fn side_prefix_without_space_is_padded() {
        let format = CommentFormat::new("#", "#").unwrap_or_default();
        let raw = dump("x", CommentType::Side, 0, &format);
        assert_eq!(raw, " #x");
    }

    #[test]
    fn applies_suffixes() {
        let format = CommentFormat::new("# ", "# ")
            .and_then(|f| f.with_suffix(" #", " -"))
            .unwrap_or_default();
        let raw = dump("a\nb", CommentType::Block, 0, &format);
        assert_eq!(raw, "# a -\n# b #");
        assert_eq!(parse(&raw, &format, true).as_deref(), Some("a\nb"));
    }

    #[test]
    fn parses_block_comment() {
        let text = parse("  # first\n  #second", &CommentFormat::block(), true);
        assert_eq!(text.as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn parses_side_comment() {
        let text = parse(" # side-a", &CommentFormat::side(), true);
        assert_eq!(text.as_deref(), Some("side-a"));
    }

    #[test]
    fn trim_drops_blank_edges() {
        let raw = "\n# a\n\n# b\n\n";
        assert_eq!(
            parse(raw, &CommentFormat::block(), true).as_deref(),
            Some("a\n\nb")
        );
        assert_eq!(
            parse(raw, &CommentFormat::block(), false).as_deref(),
            Some("\na\n\nb\n")
        );
    }

    #[test]
    fn blank_only_comment_parses_to_none() {
        assert_eq!(parse("\n\n", &CommentFormat::block(), true), None);
    }
}
