//! Value coercion for declared values
//!
//! Spec files written by hand (or generated by provisioning tools) often
//! carry numbers and booleans as strings. A `type` on an assertion runs
//! the declared value through [`cast`] before it is compared or written.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::{Number, Value};
use std::str::FromStr;
use std::sync::LazyLock;

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?[0-9]*$").expect("integer pattern is valid"));

static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?[0-9]*\.?[0-9]+$").expect("float pattern is valid"));

/// Target type of a cast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    String,
    Integer,
    Float,
    Boolean,
}

impl FromStr for CastType {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "string" | "str" => Ok(Self::String),
            "integer" | "int" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "boolean" | "bool" => Ok(Self::Boolean),
            _ => Err(Error::UnknownCastType(name.to_string())),
        }
    }
}

impl CastType {
    /// Canonical name of this type
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }

    /// Coerce a value to this type
    pub fn apply(&self, value: &Value) -> Result<Value> {
        match self {
            Self::String => Ok(Value::String(to_string(value))),
            Self::Integer => to_integer(value).ok_or_else(|| Error::cast(self.name(), value)),
            Self::Float => to_float(value).ok_or_else(|| Error::cast(self.name(), value)),
            Self::Boolean => to_boolean(value)
                .map(Value::Bool)
                .ok_or_else(|| Error::cast(self.name(), value)),
        }
    }
}

/// Cast a value to the named type.
///
/// Accepted names are `string`/`str`, `integer`/`int`, `float` and
/// `boolean`/`bool`. Unknown names fail regardless of the value.
pub fn cast(type_name: &str, value: &Value) -> Result<Value> {
    type_name.parse::<CastType>()?.apply(value)
}

fn to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn to_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
        Value::Bool(b) => Some(Value::from(i64::from(*b))),
        Value::String(s) if INTEGER.is_match(s) => {
            let digits = s.trim_start_matches(['-', '+']);
            if digits.is_empty() {
                return Some(Value::from(0));
            }
            s.parse::<i64>()
                .map(Value::from)
                .or_else(|_| s.parse::<u64>().map(Value::from))
                .ok()
        }
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(Value::from(1)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(Value::from(0)),
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => n.as_f64().and_then(Number::from_f64).map(Value::Number),
        Value::String(s) if FLOAT.is_match(s) => s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        _ => None,
    }
}

fn to_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => Some(false),
            Some(f) if f == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "0" | "false" | "False" | "FALSE" => Some(false),
            "1" | "true" | "True" | "TRUE" => Some(true),
            _ => None,
        },
        _ => None,
    }
}
