//! Path-based access to a [`serde_yaml::Value`] tree.

use indexmap::IndexSet;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::path::{self, Segment};
use crate::scanner::unquote;

/// Structural facts about the value tree that the comment tree needs.
pub trait ValueShape {
    /// Length of the sequence at `path`, or `None` if there is no sequence
    /// there.
    fn sequence_len(&self, path: &[Segment]) -> Option<usize>;
}

impl ValueShape for Value {
    fn sequence_len(&self, path: &[Segment]) -> Option<usize> {
        get(self, path)
            .and_then(Value::as_sequence)
            .map(Vec::len)
    }
}

/// No values known.
impl ValueShape for () {
    fn sequence_len(&self, _path: &[Segment]) -> Option<usize> {
        None
    }
}

/// Text form of a mapping key, for scalar keys.
pub fn key_text(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// Text the serializer writes for `value` after a `- ` entry marker, for
/// scalars that fit on one line.
pub fn scalar_text(value: &Value) -> Option<String> {
    if matches!(
        value,
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_)
    ) {
        return None;
    }
    let rendered = serde_yaml::to_string(value).ok()?;
    let line = rendered.strip_suffix('\n').unwrap_or(&rendered);
    (!line.contains('\n')).then(|| unquote(line))
}

/// Existing key of `map` whose text form is `name`.
fn find_key(map: &Mapping, name: &str) -> Option<Value> {
    if map.contains_key(name) {
        return Some(Value::String(name.to_string()));
    }
    map.keys()
        .find(|key| key_text(key).as_deref() == Some(name))
        .cloned()
}

pub fn get<'v>(root: &'v Value, path: &[Segment]) -> Option<&'v Value> {
    path.iter().try_fold(root, |value, segment| match segment {
        Segment::Key(name) => {
            let map = value.as_mapping()?;
            map.get(find_key(map, name)?)
        }
        Segment::Index(index) => {
            let seq = value.as_sequence()?;
            seq.get(path::resolve_index(*index, Some(seq.len()))?)
        }
    })
}

fn not_found(path: &[Segment], separator: char, reason: &str) -> Error {
    Error::ValuePath {
        path: path::render(path, separator),
        reason: reason.to_string(),
    }
}

/// Step into `segment`, creating a mapping entry or appending a sequence
/// element when it does not exist yet.
fn child_mut<'v>(
    parent: &'v mut Value,
    segment: &Segment,
    at: &[Segment],
    separator: char,
) -> Result<&'v mut Value> {
    match segment {
        Segment::Key(name) => {
            if parent.is_null() {
                *parent = Value::Mapping(Mapping::new());
            }
            let Value::Mapping(map) = parent else {
                return Err(not_found(at, separator, "parent is not a mapping"));
            };
            let key = find_key(map, name).unwrap_or_else(|| Value::String(name.clone()));
            Ok(map.entry(key).or_insert(Value::Null))
        }
        Segment::Index(index) => {
            if parent.is_null() {
                *parent = Value::Sequence(Vec::new());
            }
            let Value::Sequence(seq) = parent else {
                return Err(not_found(at, separator, "parent is not a sequence"));
            };
            let len = seq.len();
            let index = path::resolve_index(*index, Some(len))
                .filter(|&i| i <= len)
                .ok_or_else(|| not_found(at, separator, "list index out of range"))?;
            if index == len {
                seq.push(Value::Null);
            }
            Ok(&mut seq[index])
        }
    }
}

/// Store `value` at `path`, creating intermediate mappings as needed.
///
/// An index equal to the length of a sequence appends to it.
///
/// # Errors
///
/// Returns [`Error::ValuePath`] when the path runs through a scalar or an
/// index lies beyond the end of a sequence.
pub fn set(root: &mut Value, path: &[Segment], value: Value, separator: char) -> Result<()> {
    let mut node = root;
    for (depth, segment) in path.iter().enumerate() {
        node = child_mut(node, segment, &path[..=depth], separator)?;
    }
    *node = value;
    Ok(())
}

/// Remove the value at `path`, returning it.
pub fn remove(root: &mut Value, path: &[Segment]) -> Option<Value> {
    let (last, parents) = path.split_last()?;
    let mut node = root;
    for segment in parents {
        node = match segment {
            Segment::Key(name) => {
                let map = node.as_mapping_mut()?;
                let key = find_key(map, name)?;
                map.get_mut(&key)?
            }
            Segment::Index(index) => {
                let seq = node.as_sequence_mut()?;
                let index = path::resolve_index(*index, Some(seq.len()))?;
                seq.get_mut(index)?
            }
        };
    }
    match last {
        Segment::Key(name) => {
            let map = node.as_mapping_mut()?;
            let key = find_key(map, name)?;
            map.remove(&key)
        }
        Segment::Index(index) => {
            let seq = node.as_sequence_mut()?;
            let index = path::resolve_index(*index, Some(seq.len())).filter(|&i| i < seq.len())?;
            Some(seq.remove(index))
        }
    }
}

/// Paths of the mapping keys in `root`, in document order.
///
/// With `deep`, keys of nested mappings are included. Sequences are not
/// descended into.
pub fn keys(root: &Value, deep: bool, separator: char) -> IndexSet<String> {
    let mut out = IndexSet::new();
    let mut prefix = Vec::new();
    collect_keys(root, deep, separator, &mut prefix, &mut out);
    out
}

fn collect_keys(
    value: &Value,
    deep: bool,
    separator: char,
    prefix: &mut Vec<Segment>,
    out: &mut IndexSet<String>,
) {
    let Some(map) = value.as_mapping() else {
        return;
    };
    for (key, child) in map {
        let Some(name) = key_text(key) else {
            continue;
        };
        prefix.push(Segment::Key(name));
        out.insert(path::render(prefix, separator));
        if deep {
            collect_keys(child, deep, separator, prefix, out);
        }
        prefix.pop();
    }
}

/// Nothing worth serializing: no values or an empty mapping.
pub fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Mapping(map) => map.is_empty(),
        _ => false,
    }
}
