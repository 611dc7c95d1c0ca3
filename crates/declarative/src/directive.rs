//! Directives - how a key's desired state is tested and achieved
//!
//! Every directive pairs a `test` (is the current value in sync?) with an
//! `apply` (what value brings it in sync?). Both are pure: `apply` only
//! computes the new value, writing it is the executor's job.
//!
//! | directive        | in sync when                                  |
//! |------------------|-----------------------------------------------|
//! | `set`            | current equals desired                        |
//! | `unset`          | current is null                               |
//! | `array_contains` | current is an array holding desired           |
//! | `array_missing`  | current is an array without desired           |
//! | `init`           | current is not null                           |
//!
//! Array directives refuse to touch an absent key unless `create` (or
//! `clobber`) is set, and refuse to replace a non-array value unless
//! `clobber` is set. `array_missing` additionally accepts an absent key
//! as-is when `unset_ok` is set.

use crate::adapter::Adapter;
use crate::error::{Error, Result};
use crate::value::Options;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The closed set of directives an assertion can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// Key is set to the value
    Set,
    /// Key is absent
    Unset,
    /// Key is an array containing the value
    ArrayContains,
    /// Key is an array not containing the value
    ArrayMissing,
    /// Key is set to the value only if currently absent
    Init,
}

/// In-sync check: `(key, current, desired, adapter, options)`
type TestFn = fn(&Value, &Value, &Value, &dyn Adapter, &Options) -> bool;

/// New value computation: `(key, current, desired, adapter, options)`
type ApplyFn = fn(&Value, &Value, &Value, &dyn Adapter, &Options) -> Result<Value>;

/// A directive's test/apply pair
struct Semantics {
    test: TestFn,
    apply: ApplyFn,
}

const SET: Semantics = Semantics {
    test: set_test,
    apply: set_apply,
};

const UNSET: Semantics = Semantics {
    test: unset_test,
    apply: unset_apply,
};

const ARRAY_CONTAINS: Semantics = Semantics {
    test: array_contains_test,
    apply: array_contains_apply,
};

const ARRAY_MISSING: Semantics = Semantics {
    test: array_missing_test,
    apply: array_missing_apply,
};

const INIT: Semantics = Semantics {
    test: init_test,
    apply: init_apply,
};

impl Directive {
    /// Every directive, in declaration order
    pub const ALL: [Directive; 5] = [
        Self::Set,
        Self::Unset,
        Self::ArrayContains,
        Self::ArrayMissing,
        Self::Init,
    ];

    /// Name as written in a spec
    pub fn name(&self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Unset => "unset",
            Self::ArrayContains => "array_contains",
            Self::ArrayMissing => "array_missing",
            Self::Init => "init",
        }
    }

    fn semantics(&self) -> &'static Semantics {
        match self {
            Self::Set => &SET,
            Self::Unset => &UNSET,
            Self::ArrayContains => &ARRAY_CONTAINS,
            Self::ArrayMissing => &ARRAY_MISSING,
            Self::Init => &INIT,
        }
    }

    /// Check whether the current value satisfies this directive
    pub fn test(
        &self,
        key: &Value,
        current: &Value,
        desired: &Value,
        adapter: &dyn Adapter,
        options: &Options,
    ) -> bool {
        (self.semantics().test)(key, current, desired, adapter, options)
    }

    /// Compute the value that satisfies this directive
    pub fn apply(
        &self,
        key: &Value,
        current: &Value,
        desired: &Value,
        adapter: &dyn Adapter,
        options: &Options,
    ) -> Result<Value> {
        (self.semantics().apply)(key, current, desired, adapter, options)
    }
}

impl FromStr for Directive {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.name() == name)
            .ok_or_else(|| Error::Parse(format!("unknown directive {:?}", name)))
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared equality primitive, delegating to the adapter
pub fn values_equal(current: &Value, desired: &Value, adapter: &dyn Adapter) -> bool {
    adapter.values_equal(current, desired)
}

fn contains(items: &[Value], desired: &Value, adapter: &dyn Adapter) -> bool {
    items.iter().any(|v| values_equal(v, desired, adapter))
}

// ============================================================================
// set
// ============================================================================

fn set_test(_: &Value, current: &Value, desired: &Value, adapter: &dyn Adapter, _: &Options) -> bool {
    values_equal(current, desired, adapter)
}

fn set_apply(
    _: &Value,
    _: &Value,
    desired: &Value,
    _: &dyn Adapter,
    _: &Options,
) -> Result<Value> {
    Ok(desired.clone())
}

// ============================================================================
// unset
// ============================================================================

fn unset_test(_: &Value, current: &Value, _: &Value, _: &dyn Adapter, _: &Options) -> bool {
    current.is_null()
}

fn unset_apply(
    key: &Value,
    _: &Value,
    desired: &Value,
    _: &dyn Adapter,
    _: &Options,
) -> Result<Value> {
    if !desired.is_null() {
        return Err(Error::UnsetWithValue {
            key: key.to_string(),
            value: desired.to_string(),
        });
    }
    Ok(Value::Null)
}

// ============================================================================
// array_contains
// ============================================================================

fn array_contains_test(
    _: &Value,
    current: &Value,
    desired: &Value,
    adapter: &dyn Adapter,
    _: &Options,
) -> bool {
    current
        .as_array()
        .is_some_and(|items| contains(items, desired, adapter))
}

fn array_contains_apply(
    key: &Value,
    current: &Value,
    desired: &Value,
    adapter: &dyn Adapter,
    options: &Options,
) -> Result<Value> {
    match current {
        Value::Array(items) => {
            if contains(items, desired, adapter) {
                return Ok(current.clone());
            }
            let mut items = items.clone();
            items.push(desired.clone());
            Ok(Value::Array(items))
        }
        Value::Null => {
            if options.create() || options.clobber() {
                Ok(Value::Array(vec![desired.clone()]))
            } else {
                Err(Error::StructureConflict {
                    message: format!(
                        "can not ensure {} contains {} because the key does not exist \
                         and options.create is not true.",
                        key, desired
                    ),
                })
            }
        }
        _ => {
            if options.clobber() {
                Ok(Value::Array(vec![desired.clone()]))
            } else {
                Err(Error::StructureConflict {
                    message: format!(
                        "can not ensure {} contains {} because the value is {} \
                         and options.clobber is not true.",
                        key, desired, current
                    ),
                })
            }
        }
    }
}

// ============================================================================
// array_missing
// ============================================================================

fn array_missing_test(
    _: &Value,
    current: &Value,
    desired: &Value,
    adapter: &dyn Adapter,
    options: &Options,
) -> bool {
    match current {
        Value::Null => options.unset_ok(),
        Value::Array(items) => !contains(items, desired, adapter),
        _ => false,
    }
}

fn array_missing_apply(
    key: &Value,
    current: &Value,
    desired: &Value,
    adapter: &dyn Adapter,
    options: &Options,
) -> Result<Value> {
    match current {
        Value::Array(items) => Ok(Value::Array(
            items
                .iter()
                .filter(|v| !values_equal(v, desired, adapter))
                .cloned()
                .collect(),
        )),
        // the only outcome that leaves the key without an array
        Value::Null if options.unset_ok() => Ok(Value::Null),
        Value::Null => {
            if options.create() || options.clobber() {
                Ok(Value::Array(Vec::new()))
            } else {
                Err(Error::StructureConflict {
                    message: format!(
                        "can not ensure {} is missing {} because the key does not exist \
                         and options.create is not true.",
                        key, desired
                    ),
                })
            }
        }
        _ => {
            if options.clobber() {
                Ok(Value::Array(Vec::new()))
            } else {
                Err(Error::StructureConflict {
                    message: format!(
                        "can not ensure {} is missing {} because the value is {} \
                         and options.clobber is not true.",
                        key, desired, current
                    ),
                })
            }
        }
    }
}

// ============================================================================
// init
// ============================================================================

fn init_test(_: &Value, current: &Value, _: &Value, _: &dyn Adapter, _: &Options) -> bool {
    !current.is_null()
}

fn init_apply(
    _: &Value,
    _: &Value,
    desired: &Value,
    _: &dyn Adapter,
    _: &Options,
) -> Result<Value> {
    Ok(desired.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{CLOBBER, CREATE, UNSET_OK};
    use serde_json::json;

    #[derive(Debug)]
    struct Plain;

    impl Adapter for Plain {
        fn read(&self, _: &Value, _: &Options) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }

        fn write(&self, _: &Value, _: &Value, _: &Options) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Reads booleans back as 0/1, like a plist read through the shell
    #[derive(Debug)]
    struct IntBools;

    impl Adapter for IntBools {
        fn read(&self, _: &Value, _: &Options) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }

        fn write(&self, _: &Value, _: &Value, _: &Options) -> anyhow::Result<()> {
            Ok(())
        }

        fn values_equal(&self, current: &Value, desired: &Value) -> bool {
            match (current, desired) {
                (Value::Number(n), Value::Bool(b)) => n.as_i64() == Some(i64::from(*b)),
                _ => current == desired,
            }
        }
    }

    fn opts(flags: &[&str]) -> Options {
        flags.iter().map(|f| (*f, json!(true))).collect()
    }

    fn key() -> Value {
        json!("k")
    }

    #[test]
    fn test_parse_names() {
        for directive in Directive::ALL {
            assert_eq!(directive.name().parse::<Directive>().unwrap(), directive);
        }
        assert!("append".parse::<Directive>().is_err());
        assert!(matches!("SET".parse::<Directive>(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_reflexive_for_set_and_init() {
        for v in [json!("x"), json!(1), json!([1, 2]), json!({"a": true})] {
            for d in [Directive::Set, Directive::Init] {
                assert!(d.test(&key(), &v, &v, &Plain, &Options::new()), "{} {}", d, v);
            }
        }
    }

    #[test]
    fn test_set() {
        let d = Directive::Set;
        assert!(!d.test(&key(), &Value::Null, &json!("ex"), &Plain, &Options::new()));
        assert!(d.test(&key(), &json!(1), &json!(true), &IntBools, &Options::new()));
        for current in [Value::Null, json!(5), json!(["a"])] {
            assert_eq!(
                d.apply(&key(), &current, &json!("ex"), &Plain, &Options::new()).unwrap(),
                json!("ex")
            );
        }
    }

    #[test]
    fn test_unset() {
        let d = Directive::Unset;
        assert!(d.test(&key(), &Value::Null, &Value::Null, &Plain, &Options::new()));
        assert!(!d.test(&key(), &json!(false), &Value::Null, &Plain, &Options::new()));
        assert_eq!(
            d.apply(&key(), &json!("x"), &Value::Null, &Plain, &Options::new()).unwrap(),
            Value::Null
        );
        assert!(matches!(
            d.apply(&key(), &json!("x"), &json!("y"), &Plain, &Options::new()),
            Err(Error::UnsetWithValue { .. })
        ));
    }

    #[test]
    fn test_init() {
        let d = Directive::Init;
        assert!(!d.test(&key(), &Value::Null, &json!(1), &Plain, &Options::new()));
        assert!(d.test(&key(), &json!(0), &json!(1), &Plain, &Options::new()));
        assert_eq!(
            d.apply(&key(), &Value::Null, &json!(1), &Plain, &Options::new()).unwrap(),
            json!(1)
        );
    }

    #[test]
    fn test_array_contains_test() {
        let d = Directive::ArrayContains;
        let v = json!("v");
        assert!(!d.test(&key(), &Value::Null, &v, &Plain, &Options::new()));
        assert!(!d.test(&key(), &json!("v"), &v, &Plain, &Options::new()));
        assert!(!d.test(&key(), &json!(["x"]), &v, &Plain, &Options::new()));
        assert!(d.test(&key(), &json!(["x", "v"]), &v, &Plain, &Options::new()));
    }

    #[test]
    fn test_array_contains_apply() {
        let d = Directive::ArrayContains;
        let v = json!("v");

        // (current, flags, expected result or None for conflict)
        let table: Vec<(Value, Vec<&str>, Option<Value>)> = vec![
            (Value::Null, vec![], None),
            (Value::Null, vec![CREATE], Some(json!(["v"]))),
            (Value::Null, vec![CLOBBER], Some(json!(["v"]))),
            (json!("x"), vec![], None),
            (json!("x"), vec![CREATE], None),
            (json!("x"), vec![CLOBBER], Some(json!(["v"]))),
            (json!([]), vec![], Some(json!(["v"]))),
            (json!(["x"]), vec![], Some(json!(["x", "v"]))),
            (json!(["v"]), vec![], Some(json!(["v"]))),
        ];

        for (current, flags, expected) in table {
            let result = d.apply(&key(), &current, &v, &Plain, &opts(&flags));
            match expected {
                Some(value) => assert_eq!(result.unwrap(), value, "{} {:?}", current, flags),
                None => assert!(
                    matches!(result, Err(Error::StructureConflict { .. })),
                    "{} {:?}",
                    current,
                    flags
                ),
            }
        }
    }

    #[test]
    fn test_array_contains_conflict_messages() {
        let d = Directive::ArrayContains;
        let err = d
            .apply(&key(), &Value::Null, &json!("v"), &Plain, &Options::new())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"k\""));
        assert!(msg.contains("create"));

        let err = d
            .apply(&key(), &json!(42), &json!("v"), &Plain, &Options::new())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"k\""));
        assert!(msg.contains("42"));
        assert!(msg.contains("clobber"));
    }

    #[test]
    fn test_array_contains_uses_adapter_equality() {
        let d = Directive::ArrayContains;
        let current = json!([1]);
        assert!(d.test(&key(), &current, &json!(true), &IntBools, &Options::new()));
        assert_eq!(
            d.apply(&key(), &current, &json!(true), &IntBools, &Options::new()).unwrap(),
            json!([1])
        );
    }

    #[test]
    fn test_array_missing_test() {
        let d = Directive::ArrayMissing;
        let v = json!("v");
        assert!(!d.test(&key(), &Value::Null, &v, &Plain, &Options::new()));
        assert!(d.test(&key(), &Value::Null, &v, &Plain, &opts(&[UNSET_OK])));
        assert!(d.test(&key(), &json!(["x"]), &v, &Plain, &Options::new()));
        assert!(!d.test(&key(), &json!(["x", "v"]), &v, &Plain, &Options::new()));
        assert!(!d.test(&key(), &json!("x"), &v, &Plain, &opts(&[UNSET_OK, CLOBBER])));
    }

    #[test]
    fn test_array_missing_apply() {
        let d = Directive::ArrayMissing;
        let v = json!("v");

        let table: Vec<(Value, Vec<&str>, Option<Value>)> = vec![
            (Value::Null, vec![], None),
            (Value::Null, vec![CREATE], Some(json!([]))),
            (Value::Null, vec![CLOBBER], Some(json!([]))),
            (Value::Null, vec![UNSET_OK], Some(Value::Null)),
            (json!("x"), vec![], None),
            (json!("x"), vec![CREATE], None),
            (json!("x"), vec![CLOBBER], Some(json!([]))),
            (json!(["x", "v", "y", "v"]), vec![], Some(json!(["x", "y"]))),
            (json!(["x", "y"]), vec![], Some(json!(["x", "y"]))),
        ];

        for (current, flags, expected) in table {
            let result = d.apply(&key(), &current, &v, &Plain, &opts(&flags));
            match expected {
                Some(value) => assert_eq!(result.unwrap(), value, "{} {:?}", current, flags),
                None => assert!(
                    matches!(result, Err(Error::StructureConflict { .. })),
                    "{} {:?}",
                    current,
                    flags
                ),
            }
        }
    }

    #[test]
    fn test_array_missing_uses_adapter_equality() {
        let d = Directive::ArrayMissing;
        assert!(!d.test(&key(), &json!([0, 1]), &json!(false), &IntBools, &Options::new()));
        assert_eq!(
            d.apply(&key(), &json!([0, 1]), &json!(false), &IntBools, &Options::new())
                .unwrap(),
            json!([1])
        );
    }

    #[test]
    fn test_false_flag_is_not_set() {
        let mut options = Options::new();
        options.insert(CREATE, json!(false));
        assert!(
            Directive::ArrayContains
                .apply(&key(), &Value::Null, &json!("v"), &Plain, &options)
                .is_err()
        );
    }
}
