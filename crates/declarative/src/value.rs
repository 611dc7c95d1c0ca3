//! Value helpers and directive options
//!
//! Values, keys and options are plain `serde_json::Value`s. `Value::Null`
//! is the absent marker: adapters read it for missing keys and write it to
//! delete them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Permit materializing a key that is currently absent
pub const CREATE: &str = "create";

/// Permit replacing an existing value of the wrong structure
pub const CLOBBER: &str = "clobber";

/// Accept an absent key as satisfying `array_missing`
pub const UNSET_OK: &str = "unset_ok";

/// Whether a value counts as true when used as a flag.
///
/// Everything except `null` and `false` is truthy.
pub fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// Modifier flags and adapter passthrough options for one state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(Map<String, Value>);

impl Options {
    /// Create an empty option set
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Get an option by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether an option is present, regardless of its value
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Insert an option, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Whether a flag option evaluates true
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(is_truthy)
    }

    /// `create` flag
    pub fn create(&self) -> bool {
        self.flag(CREATE)
    }

    /// `clobber` flag
    pub fn clobber(&self) -> bool {
        self.flag(CLOBBER)
    }

    /// `unset_ok` flag
    pub fn unset_ok(&self) -> bool {
        self.flag(UNSET_OK)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Options {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
