//! States and spec parsing
//!
//! A spec maps adapter names to one assertion or a list of them:
//!
//! ```json
//! {
//!   "defaults": [
//!     { "key": "com.apple.dock:autohide", "set": true },
//!     { "key": "com.apple.dock:persistent-apps", "array_missing": "Safari", "unset_ok": true }
//!   ],
//!   "git_config": { "key": "user.name", "init": "nobody" }
//! }
//! ```
//!
//! Parsing normalizes every assertion into a [`State`] with exactly one
//! directive. Unknown top-level keys are folded into the state's options.

use crate::adapter::AdapterRef;
use crate::cast::cast;
use crate::diff::{Plan, compute_plan};
use crate::directive::Directive;
use crate::error::{Error, Result};
use crate::executor::{execute_states, write_plan};
use crate::registry::Registry;
use crate::types::{Changes, ExecuteOptions};
use crate::value::{Options, is_truthy};
use serde_json::{Map, Value};

const KEY: &str = "key";
const OPTIONS: &str = "options";
const TYPE: &str = "type";
const UNSET_WHEN: &str = "unset_when";
const UNSET_WHEN_FALSE: &str = "unset_when_false";

/// One normalized assertion about a key
#[derive(Debug, Clone)]
pub struct State {
    /// Name the adapter was resolved under
    pub adapter_name: String,
    /// Backend responsible for the key
    pub adapter: AdapterRef,
    /// Adapter-specific key
    pub key: Value,
    /// How the key is tested and changed
    pub directive: Directive,
    /// Directive argument
    pub value: Value,
    /// Modifier flags and adapter passthrough options
    pub options: Options,
}

impl State {
    /// Short description used in logs and UI output
    pub fn describe(&self) -> String {
        format!(
            "{} {} {} {}",
            self.adapter_name, self.key, self.directive, self.value
        )
    }
}

/// An ordered list of states, reconciled together
#[derive(Debug, Clone, Default)]
pub struct StateSet {
    states: Vec<State>,
}

impl StateSet {
    /// Create an empty state set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a spec, resolving adapter names through the registry
    pub fn from_spec(spec: &Value, registry: &Registry) -> Result<Self> {
        let Value::Object(adapters) = spec else {
            return Err(Error::type_error(
                "spec must be an object of adapter names to states",
                spec,
            ));
        };

        let mut set = Self::new();
        for (adapter_name, entries) in adapters {
            let adapter = registry.get(adapter_name)?;

            let entries: Vec<&Value> = match entries {
                Value::Object(_) => vec![entries],
                Value::Array(items) => items.iter().collect(),
                other => {
                    return Err(Error::type_error(
                        "each value of the spec must be a single state object or an array of states",
                        other,
                    ));
                }
            };

            for entry in entries {
                set.add(parse_state(adapter_name, &adapter, entry)?);
            }
        }

        log::debug!("Parsed {} states", set.len());
        Ok(set)
    }

    /// Append a state
    pub fn add(&mut self, state: State) {
        self.states.push(state);
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Read every key and compute new values, without writing anything
    pub fn plan(&self) -> Result<Plan> {
        compute_plan(&self.states)
    }

    /// Bring every state in sync, rolling back on a failed write
    pub fn execute(&self, options: &ExecuteOptions) -> Result<Changes> {
        execute_states(&self.states, options)
    }

    /// Write a plan computed earlier by [`StateSet::plan`]
    ///
    /// Nothing is read again, so the values written are exactly the ones
    /// the plan shows. Fails with [`Error::Parse`] if the plan was computed
    /// from a different state set.
    pub fn execute_plan(&self, plan: &Plan, options: &ExecuteOptions) -> Result<Changes> {
        write_plan(&self.states, plan, options)
    }
}

fn parse_state(adapter_name: &str, adapter: &AdapterRef, entry: &Value) -> Result<State> {
    let Value::Object(fields) = entry else {
        return Err(Error::type_error("each state must be an object", entry));
    };

    let mut options = match fields.get(OPTIONS) {
        None | Some(Value::Null) => Options::new(),
        Some(Value::Object(map)) => Options::from(map.clone()),
        Some(other) => return Err(Error::type_error("options must be an object", other)),
    };

    let mut key = None;
    let mut directives = Vec::new();
    let mut type_name = None;
    let mut unset_when_false = false;
    let mut unset_when = false;

    for (name, value) in fields {
        match name.as_str() {
            KEY => key = Some(value),
            OPTIONS => {}
            TYPE => {
                let name = value
                    .as_str()
                    .ok_or_else(|| Error::type_error("type must be a string", value))?;
                type_name = Some(name);
            }
            UNSET_WHEN_FALSE => unset_when_false = is_truthy(value),
            UNSET_WHEN => unset_when = cast("bool", value)? == Value::Bool(true),
            other => match other.parse::<Directive>() {
                Ok(directive) => directives.push((directive, value)),
                Err(_) => fold_option(&mut options, other, value, fields)?,
            },
        }
    }

    let key = match key {
        Some(Value::Null) | None => {
            return Err(Error::Parse(format!(
                "no key found in state {}",
                Value::Object(fields.clone())
            )));
        }
        Some(key) => key.clone(),
    };

    let (directive, value) = match directives.as_slice() {
        [single] => *single,
        [] => {
            return Err(Error::Parse(format!(
                "no directive found in state {}",
                entry
            )));
        }
        _ => {
            return Err(Error::Parse(format!(
                "multiple directives found in state {}",
                entry
            )));
        }
    };

    let (directive, value) = if unset_when_false && is_false(value) {
        (Directive::Unset, Value::Null)
    } else if unset_when {
        (Directive::Unset, Value::Null)
    } else if let Some(type_name) = type_name {
        (directive, cast(type_name, value)?)
    } else {
        (directive, value.clone())
    };

    Ok(State {
        adapter_name: adapter_name.to_string(),
        adapter: adapter.clone(),
        key,
        directive,
        value,
        options,
    })
}

/// Fold an unrecognized top-level key into the options
fn fold_option(
    options: &mut Options,
    name: &str,
    value: &Value,
    fields: &Map<String, Value>,
) -> Result<()> {
    if options.contains(name) {
        return Err(Error::Parse(format!(
            "top-level state key {:?} was also provided in the options of state {}",
            name,
            Value::Object(fields.clone())
        )));
    }
    options.insert(name, value.clone());
    Ok(())
}

fn is_false(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::String(s) => s == "false" || s == "False",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryAdapter;
    use serde_json::json;
    use std::sync::Arc;

    fn registry() -> Registry {
        let registry = Registry::new();
        registry
            .register("memory", Arc::new(MemoryAdapter::new()))
            .unwrap();
        registry
            .register("other", Arc::new(MemoryAdapter::new()))
            .unwrap();
        registry
    }

    fn parse_one(entry: Value) -> Result<State> {
        let set = StateSet::from_spec(&json!({ "memory": entry }), &registry())?;
        assert_eq!(set.len(), 1);
        Ok(set.states()[0].clone())
    }

    #[test]
    fn test_single_state() {
        let state = parse_one(json!({"key": "x", "set": "ex"})).unwrap();
        assert_eq!(state.adapter_name, "memory");
        assert_eq!(state.key, json!("x"));
        assert_eq!(state.directive, Directive::Set);
        assert_eq!(state.value, json!("ex"));
        assert!(state.options.is_empty());
    }

    #[test]
    fn test_describe() {
        let state = parse_one(json!({"key": "x", "array_contains": "v"})).unwrap();
        assert_eq!(state.describe(), r#"memory "x" array_contains "v""#);
    }

    #[test]
    fn test_list_of_states_keeps_order() {
        let spec = json!({
            "memory": [
                {"key": "b", "set": 1},
                {"key": "a", "init": 2},
            ],
            "other": {"key": ["file.json", "x"], "unset": null},
        });
        let set = StateSet::from_spec(&spec, &registry()).unwrap();
        let keys: Vec<&Value> = set.states().iter().map(|s| &s.key).collect();
        assert_eq!(keys, [&json!("b"), &json!("a"), &json!(["file.json", "x"])]);
        assert_eq!(set.states()[2].directive, Directive::Unset);
        assert_eq!(set.states()[2].adapter_name, "other");
    }

    #[test]
    fn test_shape_errors() {
        let registry = registry();
        for spec in [
            json!([]),
            json!("memory"),
            json!({"memory": "x"}),
            json!({"memory": [1]}),
            json!({"memory": {"key": "x", "set": 1, "options": [1]}}),
            json!({"memory": {"key": "x", "set": 1, "type": 4}}),
        ] {
            let result = StateSet::from_spec(&spec, &registry);
            assert!(matches!(result, Err(Error::Type { .. })), "{}", spec);
        }
    }

    #[test]
    fn test_unknown_adapter() {
        let result = StateSet::from_spec(&json!({"nvram": {"key": "x", "set": 1}}), &registry());
        assert!(matches!(
            result,
            Err(Error::AdapterNotFound { name, .. }) if name == "nvram"
        ));
    }

    #[test]
    fn test_missing_key() {
        assert!(matches!(parse_one(json!({"set": 1})), Err(Error::Parse(_))));
        assert!(matches!(
            parse_one(json!({"key": null, "set": 1})),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_directive_count() {
        let none = parse_one(json!({"key": "x"})).unwrap_err();
        assert!(none.to_string().contains("no directive"));

        let many = parse_one(json!({"key": "x", "set": 1, "init": 1})).unwrap_err();
        assert!(many.to_string().contains("multiple directives"));
    }

    #[test]
    fn test_extra_keys_fold_into_options() {
        let state = parse_one(json!({
            "key": "x",
            "array_contains": "v",
            "create": true,
            "options": {"pretty": false},
        }))
        .unwrap();
        assert!(state.options.create());
        assert_eq!(state.options.get("pretty"), Some(&json!(false)));
    }

    #[test]
    fn test_option_collision() {
        let err = parse_one(json!({
            "key": "x",
            "set": 1,
            "create": true,
            "options": {"create": false},
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Parse(ref msg) if msg.contains("\"create\"")));
    }

    #[test]
    fn test_explicit_options_may_use_reserved_names() {
        let state = parse_one(json!({
            "key": "x",
            "set": 1,
            "options": {"key": "passthrough"},
        }))
        .unwrap();
        assert_eq!(state.options.get("key"), Some(&json!("passthrough")));
    }

    #[test]
    fn test_unset_when_false() {
        for value in [json!(false), json!("false"), json!("False")] {
            let state = parse_one(json!({"key": "k", "set": value, "unset_when_false": true}))
                .unwrap();
            assert_eq!(state.directive, Directive::Unset);
            assert_eq!(state.value, Value::Null);
        }

        let state =
            parse_one(json!({"key": "k", "set": 2.5, "unset_when_false": true})).unwrap();
        assert_eq!(state.directive, Directive::Set);
        assert_eq!(state.value, json!(2.5));

        let state =
            parse_one(json!({"key": "k", "set": false, "unset_when_false": false})).unwrap();
        assert_eq!(state.directive, Directive::Set);
    }

    #[test]
    fn test_unset_when() {
        let state = parse_one(json!({"key": "k", "set": "on", "unset_when": "true"})).unwrap();
        assert_eq!(state.directive, Directive::Unset);
        assert_eq!(state.value, Value::Null);

        let state = parse_one(json!({"key": "k", "set": "on", "unset_when": 0})).unwrap();
        assert_eq!(state.directive, Directive::Set);

        assert!(matches!(
            parse_one(json!({"key": "k", "set": "on", "unset_when": "maybe"})),
            Err(Error::Cast { .. })
        ));
    }

    #[test]
    fn test_type_cast() {
        let state = parse_one(json!({"key": "k", "set": "42", "type": "int"})).unwrap();
        assert_eq!(state.value, json!(42));

        assert!(matches!(
            parse_one(json!({"key": "k", "set": "x", "type": "int"})),
            Err(Error::Cast { .. })
        ));
        assert!(matches!(
            parse_one(json!({"key": "k", "set": "x", "type": "date"})),
            Err(Error::UnknownCastType(_))
        ));
    }

    #[test]
    fn test_override_precedence() {
        // unset_when_false wins over a type that would fail to cast
        let state = parse_one(json!({
            "key": "k",
            "set": "false",
            "type": "int",
            "unset_when_false": true,
        }))
        .unwrap();
        assert_eq!(state.directive, Directive::Unset);

        // unset_when wins over type
        let state = parse_one(json!({
            "key": "k",
            "set": "abc",
            "type": "int",
            "unset_when": true,
        }))
        .unwrap();
        assert_eq!(state.directive, Directive::Unset);
    }
}
