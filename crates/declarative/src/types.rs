//! Core types for reconciliation results and options

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A key that was changed by an execute call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Adapter name the state was declared under
    pub adapter: String,
    /// Adapter-specific key
    pub key: Value,
    /// Value read before the write
    pub old: Value,
    /// Value written
    pub new: Value,
}

/// Change report: every key written by an execute call, in write order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Changes(Vec<Change>);

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.0.push(change);
    }

    /// Look up the change for an adapter and key
    pub fn get(&self, adapter: &str, key: &Value) -> Option<&Change> {
        self.0
            .iter()
            .find(|c| c.adapter == adapter && &c.key == key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.0.iter()
    }
}

impl FromIterator<Change> for Changes {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Changes {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Which value a rollback writes back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackMode {
    /// Re-write the value declared in the state
    #[default]
    Desired,
    /// Restore the value read before the write
    Previous,
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Value to restore when rolling back a failed batch
    pub rollback: RollbackMode,
}

impl ExecuteOptions {
    pub fn with_rollback(mut self, rollback: RollbackMode) -> Self {
        self.rollback = rollback;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_changes_lookup() {
        let changes: Changes = [Change {
            adapter: "json".into(),
            key: json!("a"),
            old: Value::Null,
            new: json!(1),
        }]
        .into_iter()
        .collect();

        let change = changes.get("json", &json!("a")).unwrap();
        assert_eq!(change.old, Value::Null);
        assert_eq!(change.new, json!(1));
        assert!(changes.get("json", &json!("b")).is_none());
        assert!(changes.get("defaults", &json!("a")).is_none());
    }

    #[test]
    fn test_changes_serialize_as_list() {
        let mut changes = Changes::new();
        changes.push(Change {
            adapter: "json".into(),
            key: json!(["f.json", "x"]),
            old: json!(1),
            new: json!(2),
        });
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            json!([{"adapter": "json", "key": ["f.json", "x"], "old": 1, "new": 2}])
        );
    }

    #[test]
    fn test_default_rollback_mode() {
        assert_eq!(ExecuteOptions::default().rollback, RollbackMode::Desired);
    }
}
