use serde::Deserialize;

use crate::error::{Error, Result};

/// The two places a comment can be attached to a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentType {
    /// Full comment lines above the key.
    #[default]
    Block,
    /// Comment after the value, on the same line.
    Side,
}

/// How comment text is turned into comment lines and back.
///
/// `prefix` is written before the first line and `prefix_multiline` before
/// every following line. Suffixes work the same way from the other end:
/// `suffix` is appended to the last line and `suffix_multiline` to every line
/// before it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommentFormat {
    pub prefix: String,
    pub prefix_multiline: String,
    pub suffix: String,
    pub suffix_multiline: String,
}

impl CommentFormat {
    /// Block comment format: `# text` on every line.
    pub fn block() -> Self {
        Self::with_prefix("# ", "# ")
    }

    /// Side comment format: ` # text` after the value, continuation lines
    /// aligned under the first `#`.
    pub fn side() -> Self {
        Self::with_prefix(" # ", "# ")
    }

    fn with_prefix(prefix: &str, prefix_multiline: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            prefix_multiline: prefix_multiline.to_string(),
            suffix: String::new(),
            suffix_multiline: String::new(),
        }
    }

    /// Build a validated format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] if either prefix does not start with
    /// `#` (after optional leading whitespace) or any part spans lines.
    pub fn new(prefix: &str, prefix_multiline: &str) -> Result<Self> {
        let format = Self::with_prefix(prefix, prefix_multiline);
        format.validate()?;
        Ok(format)
    }

    /// Set the suffixes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] if a suffix contains a line break.
    pub fn with_suffix(mut self, suffix: &str, suffix_multiline: &str) -> Result<Self> {
        self.suffix = suffix.to_string();
        self.suffix_multiline = suffix_multiline.to_string();
        self.validate()?;
        Ok(self)
    }

    /// Check that the format produces syntactically valid comments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] describing the first offending part.
    pub fn validate(&self) -> Result<()> {
        check_prefix("prefix", &self.prefix)?;
        check_prefix("multiline prefix", &self.prefix_multiline)?;
        check_single_line("suffix", &self.suffix)?;
        check_single_line("multiline suffix", &self.suffix_multiline)?;
        Ok(())
    }
}

impl Default for CommentFormat {
    fn default() -> Self {
        Self::block()
    }
}

fn check_prefix(field: &'static str, value: &str) -> Result<()> {
    check_single_line(field, value)?;
    if !value.trim_start_matches([' ', '\t']).starts_with('#') {
        return Err(Error::InvalidFormat {
            field,
            value: value.to_string(),
            reason: "must start with '#' after optional whitespace",
        });
    }
    Ok(())
}

fn check_single_line(field: &'static str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(Error::InvalidFormat {
            field,
            value: value.to_string(),
            reason: "must not contain line breaks",
        });
    }
    Ok(())
}

/// Engine configuration.
///
/// All fields use `#[serde(default)]`, so partial configuration files are
/// completed with the defaults below. Call [`CommentOptions::validate`] after
/// deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommentOptions {
    /// Character joining path segments.
    pub path_separator: char,
    /// Spaces per nesting level for comments created through the API.
    pub indent: usize,
    pub block_format: CommentFormat,
    pub side_format: CommentFormat,
    pub header_format: CommentFormat,
    /// Drop leading and trailing blank lines when reading comments back.
    pub trim: bool,
}

impl Default for CommentOptions {
    fn default() -> Self {
        Self {
            path_separator: '.',
            indent: 2,
            block_format: CommentFormat::block(),
            side_format: CommentFormat::side(),
            header_format: CommentFormat::block(),
            trim: true,
        }
    }
}

impl CommentOptions {
    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found.
    pub fn validate(&self) -> Result<()> {
        check_separator(self.path_separator)?;
        if self.indent == 0 {
            return Err(Error::InvalidIndent);
        }
        self.block_format.validate()?;
        self.side_format.validate()?;
        self.header_format.validate()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidSeparator`] for whitespace, `#`, `\`, `[` or `]`.
    pub fn with_path_separator(mut self, separator: char) -> Result<Self> {
        check_separator(separator)?;
        self.path_separator = separator;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidIndent`] when `indent` is zero.
    pub fn with_indent(mut self, indent: usize) -> Result<Self> {
        if indent == 0 {
            return Err(Error::InvalidIndent);
        }
        self.indent = indent;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] if `format` is malformed.
    pub fn with_format(mut self, kind: CommentType, format: CommentFormat) -> Result<Self> {
        format.validate()?;
        match kind {
            CommentType::Block => self.block_format = format,
            CommentType::Side => self.side_format = format,
        }
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] if `format` is malformed.
    pub fn with_header_format(mut self, format: CommentFormat) -> Result<Self> {
        format.validate()?;
        self.header_format = format;
        Ok(self)
    }

    #[must_use]
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn format(&self, kind: CommentType) -> &CommentFormat {
        match kind {
            CommentType::Block => &self.block_format,
            CommentType::Side => &self.side_format,
        }
    }
}

fn check_separator(separator: char) -> Result<()> {
    if separator.is_whitespace() || matches!(separator, '#' | '\\' | '[' | ']') {
        return Err(Error::InvalidSeparator(separator));
    }
    Ok(())
}
