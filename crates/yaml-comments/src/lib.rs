#![doc = include_str!("../README.md")]
extern crate alloc;

mod document;
pub mod dumper;
mod error;
pub mod format;
pub mod key_tree;
mod options;
pub mod parser;
pub mod path;
pub mod scanner;
pub mod stream;
pub mod values;

pub use crate::document::{Commentable, YamlDocument};
pub use crate::error::{Error, PathErrorKind, Result};
pub use crate::key_tree::{KeyTree, Node, NodeId, NodeKind};
pub use crate::options::{CommentFormat, CommentOptions, CommentType};
pub use crate::path::Segment;
pub use crate::values::ValueShape;

/// Re-exported so callers can build values without naming the serializer
/// crate themselves.
pub use serde_yaml::Value;
