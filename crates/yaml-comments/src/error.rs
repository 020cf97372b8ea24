use core::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors produced by the comment engine and its collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A comment format was configured with a prefix or suffix that would not
    /// produce a YAML comment.
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidFormat {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("invalid path separator {0:?}")]
    InvalidSeparator(char),

    #[error("indent width must be at least 1")]
    InvalidIndent,

    #[error("invalid path {path:?}: {kind}")]
    InvalidPath { path: String, kind: PathErrorKind },

    /// A value could not be stored because an intermediate node is a scalar
    /// or a list index is out of range.
    #[error("cannot set {path:?}: {reason}")]
    ValuePath { path: String, reason: String },

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output")]
    Write(#[source] std::io::Error),

    #[error("serializer thread panicked")]
    ProducerPanicked,
}

/// What went wrong while parsing a path string.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum PathErrorKind {
    Empty,
    EmptySegment,
    DanglingEscape,
    UnclosedIndex,
    InvalidIndex(String),
    /// Text followed a closing `]` without a separator.
    TrailingText,
}

impl fmt::Display for PathErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "path is empty"),
            Self::EmptySegment => write!(f, "path contains an empty segment"),
            Self::DanglingEscape => write!(f, "dangling escape '\\' at end of path"),
            Self::UnclosedIndex => write!(f, "unclosed list index '['"),
            Self::InvalidIndex(index) => write!(f, "invalid list index '{index}'"),
            Self::TrailingText => write!(f, "unexpected text after list index"),
        }
    }
}
