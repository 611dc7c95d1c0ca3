//! Adapter trait for backend key/value stores
//!
//! An Adapter is the boundary between the reconciliation core and a
//! concrete configuration store (a plist domain, a JSON file, git config).
//! The core only ever reads a key, compares, and writes a key back.

use crate::value::Options;
use anyhow::Result;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Core trait for configuration backends
///
/// # Example
///
/// ```ignore
/// use declarative::{Adapter, Options};
/// use serde_json::Value;
/// use std::sync::Mutex;
/// use std::collections::HashMap;
///
/// #[derive(Debug, Default)]
/// struct MemoryAdapter {
///     values: Mutex<HashMap<String, Value>>,
/// }
///
/// impl Adapter for MemoryAdapter {
///     fn read(&self, key: &Value, _options: &Options) -> anyhow::Result<Value> {
///         let key = key.as_str().unwrap_or_default();
///         Ok(self.values.lock().unwrap().get(key).cloned().unwrap_or(Value::Null))
///     }
///
///     fn write(&self, key: &Value, value: &Value, _options: &Options) -> anyhow::Result<()> {
///         let key = key.as_str().unwrap_or_default().to_string();
///         let mut values = self.values.lock().unwrap();
///         if value.is_null() {
///             values.remove(&key);
///         } else {
///             values.insert(key, value.clone());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Adapter: Send + Sync + fmt::Debug {
    /// Read the current value of a key
    ///
    /// Return `Value::Null` when the key is legitimately missing. Errors
    /// are reserved for failures the adapter cannot recover from.
    fn read(&self, key: &Value, options: &Options) -> Result<Value>;

    /// Write a new value for a key
    ///
    /// Writing `Value::Null` deletes the key.
    fn write(&self, key: &Value, value: &Value, options: &Options) -> Result<()>;

    /// Compare a value read from the backend with a desired value
    ///
    /// Override when the backend's read representation loses fidelity,
    /// e.g. a store that reads booleans back as 0/1 integers.
    fn values_equal(&self, current: &Value, desired: &Value) -> bool {
        current == desired
    }
}

/// A shared adapter handle, as stored in the registry and in states
pub type AdapterRef = Arc<dyn Adapter>;
