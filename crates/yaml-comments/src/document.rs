use std::fs;
use std::io::Write;
use std::path::Path;

use indexmap::IndexSet;
use serde_yaml::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::key_tree::KeyTree;
use crate::options::{CommentOptions, CommentType};
use crate::path;
use crate::values::ValueShape;
use crate::{dumper, format, parser, stream, values};

/// Comment access by path.
pub trait Commentable {
    /// Set or clear (`None`) the comment of `kind` on the key at `path`.
    ///
    /// Setting a comment on a key that does not exist yet records it; it is
    /// written once a value appears at that path.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed or a negative list index
    /// cannot be resolved.
    fn set_comment(&mut self, path: &str, comment: Option<&str>, kind: CommentType) -> Result<()>;

    /// The comment of `kind` on the key at `path`, with comment markers
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed.
    fn comment(&self, path: &str, kind: CommentType) -> Result<Option<String>>;

    fn set_header(&mut self, header: Option<&str>);

    fn header(&self) -> Option<String>;

    fn set_footer(&mut self, footer: Option<&str>);

    fn footer(&self) -> Option<String>;
}

/// A YAML document: its values together with the comments found in (or
/// added to) it.
#[derive(Debug, Clone)]
pub struct YamlDocument {
    values: Value,
    comments: KeyTree,
    options: CommentOptions,
}

impl Default for YamlDocument {
    fn default() -> Self {
        let options = CommentOptions::default();
        Self {
            values: Value::Null,
            comments: KeyTree::new(options.path_separator),
            options,
        }
    }
}

impl YamlDocument {
    /// Empty document.
    ///
    /// # Errors
    ///
    /// Returns the first problem found in `options`.
    pub fn new(options: CommentOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            values: Value::Null,
            comments: KeyTree::new(options.path_separator),
            options,
        })
    }

    /// Parse a document with default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] if `text` is not valid YAML.
    pub fn parse(text: &str) -> Result<Self> {
        let mut document = Self::default();
        document.load_str(text)?;
        Ok(document)
    }

    /// Replace values and comments with those of `text`.
    ///
    /// On error the document is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] if `text` is not valid YAML.
    pub fn load_str(&mut self, text: &str) -> Result<()> {
        let values: Value = serde_yaml::from_str(text)?;
        self.comments = parser::parse(text, self.options.path_separator);
        self.values = values;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or [`Error::Yaml`].
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_str(&text)?;
        debug!("loaded document");
        Ok(())
    }

    /// Serialize the values and merge the comments back in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] if the values cannot be serialized.
    pub fn to_yaml_string(&self) -> Result<String> {
        let serialized = if values::is_empty_document(&self.values) {
            String::new()
        } else {
            serde_yaml::to_string(&self.values)?
        };
        Ok(dumper::dump(&serialized, &self.comments))
    }

    /// # Errors
    ///
    /// Returns [`Error::Yaml`] or [`Error::Io`].
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_yaml_string()?;
        fs::write(path, text).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("saved document");
        Ok(())
    }

    /// Write the document to `out`, serializing on a separate thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`], [`Error::Write`] or
    /// [`Error::ProducerPanicked`].
    pub fn write_to<W: Write>(&self, out: W) -> Result<()> {
        stream::dump_to(&self.values, &self.comments, stream::DEFAULT_CAPACITY, out)
    }

    fn segments(&self, path: &str) -> Result<Vec<path::Segment>> {
        path::parse(path, self.options.path_separator)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `path` is malformed.
    pub fn get(&self, path: &str) -> Result<Option<&Value>> {
        let segments = self.segments(path)?;
        Ok(values::get(&self.values, &segments))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`], or [`Error::ValuePath`] if the path
    /// runs through a scalar or past the end of a list.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let segments = self.segments(path)?;
        let value = value.into();
        let text = values::scalar_text(&value);
        values::set(
            &mut self.values,
            &segments,
            value,
            self.options.path_separator,
        )?;
        // An element edited in place keeps its comments.
        let edited = match segments.last() {
            Some(path::Segment::Index(_)) => self.comments.resolve(&segments, &self.values),
            _ => None,
        };
        if let Some(id) = edited {
            self.comments.replace_element_text(id, text);
        }
        Ok(())
    }

    /// Remove a value. Comments recorded for a key are kept; the comments
    /// of a list element go with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `path` is malformed.
    pub fn remove(&mut self, path: &str) -> Result<Option<Value>> {
        let segments = self.segments(path)?;
        let element = match segments.split_last() {
            Some((path::Segment::Index(index), parent)) => {
                path::resolve_index(*index, self.values.sequence_len(parent))
                    .map(|index| (parent, index))
            }
            _ => None,
        };
        let removed = values::remove(&mut self.values, &segments);
        let list = match (&removed, element) {
            (Some(_), Some((parent, index))) => self
                .comments
                .resolve(parent, &self.values)
                .map(|list| (list, index)),
            _ => None,
        };
        if let Some((list, index)) = list {
            debug!(path, index, "dropping element comments");
            self.comments.remove_element(list, index);
        }
        Ok(removed)
    }

    /// Key paths in document order.
    pub fn keys(&self, deep: bool) -> IndexSet<String> {
        values::keys(&self.values, deep, self.options.path_separator)
    }

    pub fn values(&self) -> &Value {
        &self.values
    }

    pub fn comments(&self) -> &KeyTree {
        &self.comments
    }

    pub fn options(&self) -> &CommentOptions {
        &self.options
    }
}

impl Commentable for YamlDocument {
    fn set_comment(&mut self, path: &str, comment: Option<&str>, kind: CommentType) -> Result<()> {
        let segments = self.segments(path)?;
        let raw = comment
            .map(|text| {
                let id = self
                    .comments
                    .get_or_create(&segments, &self.values, self.options.indent)?;
                let indent = self.comments.node(id).indentation();
                Ok::<_, Error>((id, format::dump(text, kind, indent, self.options.format(kind))))
            })
            .transpose()?;

        match raw {
            Some((id, raw)) if !raw.is_empty() => self.comments.set_comment(id, kind, Some(raw)),
            Some((id, _)) => {
                self.comments.set_comment(id, kind, None);
                self.comments.prune(id);
            }
            None => {
                if let Some(id) = self.comments.resolve(&segments, &self.values) {
                    self.comments.set_comment(id, kind, None);
                    self.comments.prune(id);
                }
            }
        }
        Ok(())
    }

    fn comment(&self, path: &str, kind: CommentType) -> Result<Option<String>> {
        let segments = self.segments(path)?;
        let Some(id) = self.comments.resolve(&segments, &self.values) else {
            return Ok(None);
        };
        Ok(self
            .comments
            .node(id)
            .comment(kind)
            .and_then(|raw| format::parse(raw, self.options.format(kind), self.options.trim)))
    }

    fn set_header(&mut self, header: Option<&str>) {
        let raw = header
            .map(|text| format::dump(text, CommentType::Block, 0, &self.options.header_format))
            .filter(|raw| !raw.is_empty());
        self.comments.set_header(raw);
    }

    fn header(&self) -> Option<String> {
        self.comments
            .header()
            .and_then(|raw| format::parse(raw, &self.options.header_format, self.options.trim))
    }

    fn set_footer(&mut self, footer: Option<&str>) {
        let raw = footer
            .map(|text| format::dump(text, CommentType::Block, 0, &self.options.block_format))
            .filter(|raw| !raw.is_empty());
        self.comments.set_footer(raw);
    }

    fn footer(&self) -> Option<String> {
        self.comments
            .footer_comment()
            .and_then(|raw| format::parse(raw, &self.options.block_format, self.options.trim))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn failed_load_leaves_document_untouched() {
        let mut document = YamlDocument::parse("# about a\na: 1\n").unwrap();
        assert!(document.load_str("a: [unclosed\n").is_err());
        assert_eq!(document.get("a").unwrap(), Some(&Value::from(1)));
        assert_eq!(
            document.comment("a", CommentType::Block).unwrap().as_deref(),
            Some("about a")
        );
    }

    #[test]
    fn comment_on_missing_key_appears_with_value() {
        let mut document = YamlDocument::default();
        document
            .set_comment("server.port", Some("listen port"), CommentType::Block)
            .unwrap();
        assert_eq!(document.to_yaml_string().unwrap(), "");

        document.set("server.port", 8080).unwrap();
        assert_eq!(
            document.to_yaml_string().unwrap(),
            "server:\n  # listen port\n  port: 8080\n"
        );
    }

    #[test]
    fn negative_index_counts_current_values() {
        let mut document = YamlDocument::parse("list:\n- 10\n- 20 # last\n").unwrap();
        document.set("list[2]", 30).unwrap();
        assert_eq!(document.get("list[-1]").unwrap(), Some(&Value::from(30)));
        assert_eq!(document.comment("list[-1]", CommentType::Side).unwrap(), None);
        assert_eq!(
            document.comment("list[-2]", CommentType::Side).unwrap().as_deref(),
            Some("last")
        );

        document.set_comment("list[-1]", Some("new"), CommentType::Side).unwrap();
        document.set_comment("list[-2]", None, CommentType::Side).unwrap();
        assert_eq!(
            document.to_yaml_string().unwrap(),
            "list:\n- 10\n- 20\n- 30 # new\n"
        );
    }

    #[test]
    fn element_edited_in_place_keeps_its_comment() {
        let mut document = YamlDocument::parse("list:\n- a # first\n- b\n").unwrap();
        document.set("list[0]", "z").unwrap();
        assert_eq!(
            document.to_yaml_string().unwrap(),
            "list:\n- z # first\n- b\n"
        );
    }

    #[test]
    fn clearing_a_comment_prunes_placeholders() {
        let mut document = YamlDocument::default();
        document
            .set_comment("a.b.c", Some("x"), CommentType::Side)
            .unwrap();
        document.set_comment("a.b.c", None, CommentType::Side).unwrap();
        assert!(document.comments().iter().next().is_none());
    }

    #[test]
    fn empty_comment_clears() {
        let mut document = YamlDocument::parse("a: 1 # side\n").unwrap();
        document.set_comment("a", Some(""), CommentType::Side).unwrap();
        assert_eq!(document.comment("a", CommentType::Side).unwrap(), None);
        assert_eq!(document.to_yaml_string().unwrap(), "a: 1\n");
    }

    #[test]
    fn header_and_footer() {
        let mut document = YamlDocument::parse("a: 1\n").unwrap();
        document.set_header(Some("Generated file\nDo not edit"));
        document.set_footer(Some("end"));
        assert_eq!(
            document.to_yaml_string().unwrap(),
            "# Generated file\n# Do not edit\n\na: 1\n# end\n"
        );
        assert_eq!(document.header().as_deref(), Some("Generated file\nDo not edit"));
        document.set_header(None);
        assert_eq!(document.header(), None);
    }

    #[test]
    fn custom_separator() {
        let options = CommentOptions::default().with_path_separator('/').unwrap();
        let mut document = YamlDocument::new(options).unwrap();
        document.load_str("a.b:\n  c: 1 # side\n").unwrap();
        assert_eq!(
            document.comment("a.b/c", CommentType::Side).unwrap().as_deref(),
            Some("side")
        );
        assert_eq!(document.get("a.b/c").unwrap(), Some(&Value::from(1)));
    }
}
