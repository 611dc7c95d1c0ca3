//! Keys shared by the path-addressed adapters
//!
//! A key names a root (a file path or a defaults domain) followed by the
//! segments of a path into the document stored there. It is written
//! either as one `:`-separated string or as an array of strings:
//!
//! ```text
//! "~/.config/app/settings.json:editor:tabSize"
//! ["~/.config/app/settings.json", "editor", "tabSize"]
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

/// Separator between segments in string keys
pub const SEPARATOR: char = ':';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("key must be a string or an array of strings, found {0}")]
    InvalidType(Value),

    #[error("key {0} is empty")]
    Empty(Value),

    #[error("key {key} has an empty or non-string segment: {segment}")]
    InvalidSegment { key: Value, segment: Value },

    #[error("key {0} names no path below its root")]
    MissingPath(Value),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub root: String,
    pub path: Vec<String>,
}

impl Key {
    pub fn parse(key: &Value) -> Result<Self, KeyError> {
        let segments: Vec<String> = match key {
            Value::String(s) => {
                if s.is_empty() {
                    return Err(KeyError::Empty(key.clone()));
                }
                s.split(SEPARATOR).map(str::to_string).collect()
            }
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(KeyError::Empty(key.clone()));
                }
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s.clone()),
                        other => Err(KeyError::InvalidSegment {
                            key: key.clone(),
                            segment: other.clone(),
                        }),
                    })
                    .collect::<Result<_, _>>()?
            }
            other => return Err(KeyError::InvalidType(other.clone())),
        };

        if let Some(empty) = segments.iter().find(|s| s.is_empty()) {
            return Err(KeyError::InvalidSegment {
                key: key.clone(),
                segment: Value::String(empty.clone()),
            });
        }

        let mut segments = segments.into_iter();
        let root = segments.next().ok_or_else(|| KeyError::Empty(key.clone()))?;
        Ok(Self {
            root,
            path: segments.collect(),
        })
    }

    /// Parse a key that must address something below its root
    pub fn parse_nested(key: &Value) -> Result<Self, KeyError> {
        let parsed = Self::parse(key)?;
        if parsed.path.is_empty() {
            return Err(KeyError::MissingPath(key.clone()));
        }
        Ok(parsed)
    }
}

/// Walk `path` down nested objects, `None` if any segment is missing
pub fn dig<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |node, segment| node.as_object()?.get(segment))
}

/// Assign `new` at `path`, creating intermediate objects
///
/// Non-object values in the way are replaced. A null `new` removes the
/// final entry instead.
pub fn deep_write(root: &mut Value, path: &[String], new: Value) {
    let Some((last, parents)) = path.split_last() else {
        *root = new;
        return;
    };

    let mut node = root;
    for segment in parents {
        node = ensure_object(node)
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let map = ensure_object(node);
    if new.is_null() {
        map.shift_remove(last);
    } else {
        map.insert(last.clone(), new);
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just made an object"),
    }
}
