//! Line-oriented YAML scanner.
//!
//! The scanner does not build a syntax tree. It walks one physical line at a
//! time and reports where keys, sequence entries, values and comments are,
//! carrying quote and block-scalar state from one line to the next.

/// Position of the scanner inside the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    NewLine,
    Key,
    AfterKey,
    Value,
    Comment,
    QuoteOpen,
    QuoteClose,
    EndOfLine,
    EndOfFile,
}

/// Scalar style that can carry over to the next line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Quote {
    #[default]
    None,
    Single,
    Double,
    /// Literal (`|`) or folded (`>`) block scalar.
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Comment,
    /// A line that starts a key, a sequence entry or a value.
    Content,
    /// A line continuing a quoted scalar opened on an earlier line.
    Continuation,
    /// A line inside a literal or folded block scalar.
    BlockScalar,
}

/// Block structure indicator at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// `- `
    Entry,
    /// `? `
    ExplicitKey,
    /// `: `
    ExplicitValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub indicator: Indicator,
    pub column: usize,
}

/// An implicit mapping key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyToken<'a> {
    /// Key as written, including quotes.
    pub raw: &'a str,
    /// Key with quoting removed.
    pub name: String,
    pub column: usize,
}

/// Header of a literal or folded block scalar opened on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Lines must be indented deeper than this to belong to the block.
    pub owner: usize,
    /// `+` chomping: trailing blank lines are part of the value.
    pub keep: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    pub text: &'a str,
    pub kind: LineKind,
    /// Leading whitespace width.
    pub indent: usize,
    pub markers: Vec<Marker>,
    /// Column where content starts once indicators are skipped.
    pub content_column: usize,
    pub key: Option<KeyToken<'a>>,
    /// Scalar text on this line, without key and comment.
    pub value: Option<&'a str>,
    /// Byte offset of the `#` starting a comment.
    pub comment: Option<usize>,
    pub block: Option<BlockHeader>,
    /// Blank line seen while a block scalar was open.
    pub in_block: bool,
    /// The line ends inside a quoted scalar.
    pub open_quote: bool,
    /// A quoted scalar opened on an earlier line closes here.
    pub closes_quote: bool,
}

impl<'a> Line<'a> {
    fn new(number: usize, text: &'a str, kind: LineKind, indent: usize) -> Self {
        Self {
            number,
            text,
            kind,
            indent,
            markers: Vec::new(),
            content_column: indent,
            key: None,
            value: None,
            comment: None,
            block: None,
            in_block: false,
            open_quote: false,
            closes_quote: false,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.kind == LineKind::Blank
    }

    pub fn is_comment(&self) -> bool {
        self.kind == LineKind::Comment
    }

    pub fn is_section_key(&self) -> bool {
        self.key.is_some()
    }

    /// The value on this line continues on following lines.
    pub fn is_multiline(&self) -> bool {
        self.open_quote || self.block.is_some()
    }

    pub fn has_entry(&self) -> bool {
        self.markers.iter().any(|m| m.indicator == Indicator::Entry)
    }

    pub fn indicator(&self) -> Option<Indicator> {
        self.markers.first().map(|m| m.indicator)
    }

    /// Byte offset where a trailing comment (with its leading whitespace)
    /// begins.
    pub fn value_end(&self) -> usize {
        match self.comment {
            Some(at) => self.text[..at].trim_end().len(),
            None => self.text.trim_end().len(),
        }
    }

    /// Trailing comment including the whitespace that separates it from the
    /// value.
    pub fn side_comment(&self) -> Option<&'a str> {
        self.comment?;
        Some(&self.text[self.value_end()..])
    }
}

/// Scanner state carried from one line to the next.
///
/// Feed lines in document order with [`LineScanner::scan`]. [`Scanner`]
/// does this for a whole document held in memory.
#[derive(Debug, Clone)]
pub struct LineScanner {
    stage: Stage,
    quote: Quote,
    /// Indentation a block scalar's lines must exceed.
    block_owner: usize,
    /// Stage to return to once the open quote closes.
    quote_return: Stage,
}

impl Default for LineScanner {
    fn default() -> Self {
        Self {
            stage: Stage::Start,
            quote: Quote::None,
            block_owner: 0,
            quote_return: Stage::Value,
        }
    }
}

impl LineScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn quote(&self) -> Quote {
        self.quote
    }

    /// A quoted or block scalar is still open.
    pub fn is_multiline(&self) -> bool {
        self.quote != Quote::None
    }

    /// Mark the end of input.
    pub fn finish(&mut self) {
        self.stage = Stage::EndOfFile;
    }

    /// Scan one physical line (without its line break).
    pub fn scan<'t>(&mut self, number: usize, text: &'t str) -> Line<'t> {
        self.stage = Stage::NewLine;
        let indent = text.len() - text.trim_start_matches([' ', '\t']).len();
        let rest = &text[indent..];

        match self.quote {
            Quote::Literal if rest.is_empty() => {
                let mut line = Line::new(number, text, LineKind::Blank, indent);
                line.in_block = true;
                self.stage = Stage::EndOfLine;
                return line;
            }
            Quote::Literal if indent > self.block_owner => {
                self.stage = Stage::EndOfLine;
                return Line::new(number, text, LineKind::BlockScalar, indent);
            }
            Quote::Literal => self.quote = Quote::None,
            Quote::Single | Quote::Double => return self.scan_continuation(number, text, indent),
            Quote::None => {}
        }

        if rest.is_empty() {
            self.stage = Stage::EndOfLine;
            return Line::new(number, text, LineKind::Blank, indent);
        }
        if rest.starts_with('#') {
            self.stage = Stage::Comment;
            let mut line = Line::new(number, text, LineKind::Comment, indent);
            line.comment = Some(indent);
            return line;
        }
        self.scan_content(number, text, indent)
    }

    fn scan_continuation<'t>(&mut self, number: usize, text: &'t str, indent: usize) -> Line<'t> {
        let mut line = Line::new(number, text, LineKind::Continuation, indent);
        self.stage = Stage::QuoteOpen;
        self.quote_return = Stage::Value;
        let mut cursor = Cursor::new(text, 0);
        cursor.at_token_start = false;
        self.run(&mut cursor, &mut line);
        line.closes_quote = self.quote == Quote::None;
        line.open_quote = !line.closes_quote;
        line
    }

    fn scan_content<'t>(&mut self, number: usize, text: &'t str, indent: usize) -> Line<'t> {
        let mut line = Line::new(number, text, LineKind::Content, indent);
        let bytes = text.as_bytes();
        let mut pos = indent;
        while let Some(indicator) = indicator_at(bytes, pos) {
            line.markers.push(Marker {
                indicator,
                column: pos,
            });
            pos += 1;
            while matches!(bytes.get(pos), Some(b' ' | b'\t')) {
                pos += 1;
            }
        }
        line.content_column = pos;

        let mut cursor = Cursor::new(text, pos);
        self.stage = if matches!(bytes.get(pos), Some(b'[' | b'{')) {
            // Flow collections are scanned as plain values.
            cursor.at_token_start = false;
            Stage::Value
        } else {
            Stage::Key
        };
        self.run(&mut cursor, &mut line);

        if let Some(colon) = cursor.key_end {
            let raw = text[pos..colon].trim_end();
            line.key = Some(KeyToken {
                raw,
                name: unquote(raw),
                column: pos,
            });
        }
        let value_start = cursor.value_start.unwrap_or(pos);
        let value_end = line.comment.unwrap_or(text.len()).max(value_start);
        let value = text[value_start..value_end].trim();
        if !value.is_empty() {
            line.value = Some(value);
        }
        line.open_quote = matches!(self.quote, Quote::Single | Quote::Double);
        if line.open_quote {
            return line;
        }
        if let Some(at) = cursor.block_at {
            let owner = match (&line.key, line.markers.last()) {
                (Some(key), _) => key.column,
                (None, Some(marker)) => marker.column,
                (None, None) => indent,
            };
            line.block = Some(BlockHeader {
                owner,
                keep: text[at..].split_whitespace().next().is_some_and(|h| h.contains('+')),
            });
            self.quote = Quote::Literal;
            self.block_owner = owner;
        }
        line
    }

    /// Character-level state machine shared by content and continuation
    /// lines.
    fn run<'t>(&mut self, cursor: &mut Cursor<'t>, line: &mut Line<'t>) {
        while let Some(b) = cursor.peek() {
            match self.stage {
                Stage::QuoteOpen => self.in_quote(cursor, b),
                Stage::QuoteClose => {
                    self.stage = self.quote_return;
                }
                Stage::Key | Stage::AfterKey | Stage::Value => {
                    if self.plain(cursor, b) {
                        line.comment = Some(cursor.pos);
                        self.stage = Stage::Comment;
                        break;
                    }
                }
                _ => break,
            }
        }
        if self.stage != Stage::Comment && self.quote == Quote::None {
            self.stage = Stage::EndOfLine;
        }
    }

    fn in_quote(&mut self, cursor: &mut Cursor<'_>, b: u8) {
        match (self.quote, b) {
            (Quote::Single, b'\'') if cursor.peek_at(1) == Some(b'\'') => cursor.advance(2),
            (Quote::Double, b'\\') => cursor.advance(2),
            (Quote::Single, b'\'') | (Quote::Double, b'"') => {
                cursor.advance(1);
                self.quote = Quote::None;
                self.stage = Stage::QuoteClose;
            }
            _ => cursor.advance(1),
        }
    }

    /// Handle one byte outside quotes. Returns `true` when a comment starts.
    fn plain(&mut self, cursor: &mut Cursor<'_>, b: u8) -> bool {
        if cursor.at_token_start {
            cursor.at_token_start = false;
            match b {
                b'\'' | b'"' => {
                    self.quote = if b == b'\'' {
                        Quote::Single
                    } else {
                        Quote::Double
                    };
                    self.quote_return = if self.stage == Stage::Key {
                        Stage::Key
                    } else {
                        Stage::Value
                    };
                    self.stage = Stage::QuoteOpen;
                    cursor.advance(1);
                    return false;
                }
                b'|' | b'>' if is_block_header(&cursor.text[cursor.pos..]) => {
                    cursor.block_at = Some(cursor.pos);
                }
                _ => {}
            }
        }
        if b == b'#' && cursor.preceded_by_space() {
            return true;
        }
        if b == b':'
            && self.stage == Stage::Key
            && matches!(cursor.peek_at(1), None | Some(b' ' | b'\t'))
        {
            cursor.key_end = Some(cursor.pos);
            cursor.advance(1);
            cursor.skip_space();
            cursor.value_start = Some(cursor.pos);
            cursor.at_token_start = true;
            self.stage = Stage::AfterKey;
            return false;
        }
        if self.stage == Stage::AfterKey {
            self.stage = Stage::Value;
        }
        cursor.advance(1);
        false
    }
}

/// Iterator over the scanned lines of a document.
pub struct Scanner<'a> {
    lines: core::iter::Enumerate<core::str::Lines<'a>>,
    state: LineScanner,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            state: LineScanner::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn quote(&self) -> Quote {
        self.state.quote()
    }

    pub fn is_multiline(&self) -> bool {
        self.state.is_multiline()
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let Some((index, text)) = self.lines.next() else {
            self.state.finish();
            return None;
        };
        Some(self.state.scan(index + 1, text))
    }
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    at_token_start: bool,
    key_end: Option<usize>,
    value_start: Option<usize>,
    block_at: Option<usize>,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Self {
            text,
            pos,
            at_token_start: true,
            key_end: None,
            value_start: None,
            block_at: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.text.len());
    }

    fn skip_space(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn preceded_by_space(&self) -> bool {
        self.pos == 0 || matches!(self.text.as_bytes()[self.pos - 1], b' ' | b'\t')
    }
}

fn indicator_at(bytes: &[u8], pos: usize) -> Option<Indicator> {
    let indicator = match bytes.get(pos)? {
        b'-' => Indicator::Entry,
        b'?' => Indicator::ExplicitKey,
        b':' => Indicator::ExplicitValue,
        _ => return None,
    };
    match bytes.get(pos + 1) {
        None | Some(b' ' | b'\t') => Some(indicator),
        _ => None,
    }
}

/// `|` or `>` followed only by chomping/indentation indicators, then
/// whitespace, a comment or the end of the line.
fn is_block_header(rest: &str) -> bool {
    let header = rest.split([' ', '\t']).next().unwrap_or_default();
    header.len() <= 3
        && header
            .bytes()
            .skip(1)
            .all(|b| b == b'+' || b == b'-' || b.is_ascii_digit())
}

/// Strip YAML quoting from a key.
pub fn unquote(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].replace("''", "'");
    }
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw[1..raw.len() - 1].chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            push_escape(&mut chars, &mut out);
        }
        return out;
    }
    raw.to_string()
}

/// Decode the double-quoted escape following a `\`. Unknown or malformed
/// escapes are kept as written.
fn push_escape(chars: &mut core::str::Chars<'_>, out: &mut String) {
    let Some(c) = chars.next() else {
        out.push('\\');
        return;
    };
    let decoded = match c {
        '0' => '\0',
        'a' => '\u{7}',
        'b' => '\u{8}',
        't' | '\t' => '\t',
        'n' => '\n',
        'v' => '\u{b}',
        'f' => '\u{c}',
        'r' => '\r',
        'e' => '\u{1b}',
        ' ' | '"' | '/' | '\\' => c,
        'N' => '\u{85}',
        '_' => '\u{a0}',
        'L' => '\u{2028}',
        'P' => '\u{2029}',
        'x' | 'u' | 'U' => {
            let width = match c {
                'x' => 2,
                'u' => 4,
                _ => 8,
            };
            let digits = chars.as_str().get(..width).unwrap_or_default();
            let code = Some(digits)
                .filter(|d| d.len() == width && d.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|d| u32::from_str_radix(d, 16).ok())
                .and_then(char::from_u32);
            if let Some(code) = code {
                out.push(code);
                chars.nth(width - 1);
            } else {
                out.push('\\');
                out.push(c);
            }
            return;
        }
        other => {
            out.push('\\');
            out.push(other);
            return;
        }
    };
    out.push(decoded);
}
