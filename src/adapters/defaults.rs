//! macOS user defaults adapter
//!
//! Keys are `domain:segment:...`. A domain is exported as an XML plist
//! with `defaults export`, edited in memory and imported back whole with
//! `defaults import`. Values are edited as plist values so entries the
//! key does not touch keep their exact plist types.

use anyhow::{Context, Result, bail};
use declarative::{Adapter, Options};
use plist::Dictionary;
use serde_json::{Map, Number, Value};
use std::io::Cursor;

use super::key::Key;
use crate::{paths, runner};

const DEFAULTS: &str = "defaults";

#[derive(Debug, Clone, Default)]
pub struct DefaultsAdapter;

impl DefaultsAdapter {
    pub fn new() -> Self {
        Self
    }

    fn export(domain: &str) -> Result<plist::Value> {
        let xml = runner::run_capture(DEFAULTS, &["export", domain, "-"])
            .with_context(|| format!("Could not export defaults domain {}", domain))?;
        if xml.is_empty() {
            return Ok(plist::Value::Dictionary(Dictionary::new()));
        }
        plist::Value::from_reader(Cursor::new(xml.as_bytes()))
            .with_context(|| format!("Could not parse defaults domain {}", domain))
    }

    fn import(domain: &str, doc: &plist::Value) -> Result<()> {
        let mut xml = Vec::new();
        doc.to_writer_xml(&mut xml)
            .with_context(|| format!("Could not serialize defaults domain {}", domain))?;
        runner::run_with_input(DEFAULTS, &["import", domain, "-"], &xml)
            .with_context(|| format!("Could not import defaults domain {}", domain))
    }
}

fn domain(key: &Key) -> String {
    paths::expand(&key.root).to_string_lossy().into_owned()
}

impl Adapter for DefaultsAdapter {
    fn read(&self, key: &Value, _options: &Options) -> Result<Value> {
        let key = Key::parse_nested(key)?;
        let doc = Self::export(&domain(&key))?;

        let found = key
            .path
            .iter()
            .try_fold(&doc, |node, segment| node.as_dictionary()?.get(segment));
        Ok(found.map_or(Value::Null, to_json))
    }

    fn write(&self, key: &Value, value: &Value, _options: &Options) -> Result<()> {
        let key = Key::parse_nested(key)?;
        let domain = domain(&key);
        let new = to_plist(value)
            .with_context(|| format!("Cannot store {} in defaults domain {}", value, domain))?;

        let mut doc = Self::export(&domain)?;
        assign(&mut doc, &key.path, new);
        Self::import(&domain, &doc)?;
        log::debug!("Imported defaults domain {}", domain);
        Ok(())
    }

    /// Defaults stores booleans written by many apps as 0/1 integers and
    /// whole numbers as reals
    fn values_equal(&self, current: &Value, desired: &Value) -> bool {
        match (current, desired) {
            (Value::Bool(b), Value::Number(n)) | (Value::Number(n), Value::Bool(b)) => {
                n.as_i64() == Some(i64::from(*b))
            }
            (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
            _ => current == desired,
        }
    }
}

/// Tag marking a JSON object that stands for a plist date
pub const DATE_TAG: &str = "$date";

/// Tag marking a JSON object that stands for plist data
pub const DATA_TAG: &str = "$data";

/// Convert a plist value to JSON
///
/// Dates become `{"$date": "<XML timestamp>"}` and data becomes
/// `{"$data": [<bytes>]}`, so both convert back to their plist types.
pub fn to_json(value: &plist::Value) -> Value {
    match value {
        plist::Value::Boolean(b) => Value::Bool(*b),
        plist::Value::Integer(i) => i
            .as_signed()
            .map(Value::from)
            .or_else(|| i.as_unsigned().map(Value::from))
            .unwrap_or(Value::Null),
        plist::Value::Real(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        plist::Value::String(s) => Value::String(s.clone()),
        plist::Value::Array(items) => Value::Array(items.iter().map(to_json).collect()),
        plist::Value::Dictionary(dict) => Value::Object(
            dict.iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
        plist::Value::Date(date) => tagged(DATE_TAG, Value::String(date.to_xml_format())),
        plist::Value::Data(bytes) => tagged(
            DATA_TAG,
            Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
        ),
        plist::Value::Uid(uid) => Value::from(uid.get()),
        _ => Value::Null,
    }
}

fn tagged(tag: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(tag.to_string(), value);
    Value::Object(map)
}

/// The plist date or data a tagged object stands for, if it is one
fn from_tagged(map: &Map<String, Value>) -> Result<Option<plist::Value>> {
    if map.len() != 1 {
        return Ok(None);
    }
    if let Some(date) = map.get(DATE_TAG) {
        let text = date
            .as_str()
            .with_context(|| format!("{} must be a string, found {}", DATE_TAG, date))?;
        let date = plist::Date::from_xml_format(text)
            .map_err(|e| anyhow::anyhow!("invalid {} {:?}: {}", DATE_TAG, text, e))?;
        return Ok(Some(plist::Value::Date(date)));
    }
    if let Some(data) = map.get(DATA_TAG) {
        let bytes = data
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
            })
            .with_context(|| format!("{} must be an array of bytes, found {}", DATA_TAG, data))?;
        return Ok(Some(plist::Value::Data(bytes)));
    }
    Ok(None)
}

/// Convert a JSON value to plist, `None` for null (removal)
pub fn to_plist(value: &Value) -> Result<Option<plist::Value>> {
    if value.is_null() {
        return Ok(None);
    }
    to_plist_inner(value).map(Some)
}

fn to_plist_inner(value: &Value) -> Result<plist::Value> {
    Ok(match value {
        Value::Null => bail!("plist cannot represent null"),
        Value::Bool(b) => plist::Value::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                plist::Value::Integer(i.into())
            } else if let Some(u) = n.as_u64() {
                plist::Value::Integer(u.into())
            } else {
                plist::Value::Real(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => plist::Value::String(s.clone()),
        Value::Array(items) => {
            plist::Value::Array(items.iter().map(to_plist_inner).collect::<Result<_>>()?)
        }
        Value::Object(map) => {
            if let Some(special) = from_tagged(map)? {
                return Ok(special);
            }
            let mut dict = Dictionary::new();
            for (k, v) in map {
                dict.insert(k.clone(), to_plist_inner(v)?);
            }
            plist::Value::Dictionary(dict)
        }
    })
}

/// Assign `new` at `path` inside a plist, creating intermediate
/// dictionaries; `None` removes the entry
pub fn assign(node: &mut plist::Value, path: &[String], new: Option<plist::Value>) {
    let Some((first, rest)) = path.split_first() else {
        if let Some(new) = new {
            *node = new;
        }
        return;
    };

    let dict = ensure_dictionary(node);
    if rest.is_empty() {
        match new {
            Some(new) => {
                dict.insert(first.clone(), new);
            }
            None => {
                dict.remove(first);
            }
        }
        return;
    }

    match dict.get_mut(first) {
        Some(child) => assign(child, rest, new),
        None if new.is_none() => {}
        None => {
            let mut child = plist::Value::Dictionary(Dictionary::new());
            assign(&mut child, rest, new);
            dict.insert(first.clone(), child);
        }
    }
}

fn ensure_dictionary(value: &mut plist::Value) -> &mut Dictionary {
    if value.as_dictionary().is_none() {
        *value = plist::Value::Dictionary(Dictionary::new());
    }
    match value {
        plist::Value::Dictionary(dict) => dict,
        _ => unreachable!("value was just made a dictionary"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn parse(xml: &str) -> plist::Value {
        plist::Value::from_reader(Cursor::new(xml.as_bytes())).unwrap()
    }

    const DOMAIN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>autohide</key>
    <true/>
    <key>tilesize</key>
    <real>48</real>
    <key>persistent-apps</key>
    <array>
        <string>Safari</string>
    </array>
    <key>lastSeen</key>
    <date>2024-01-02T03:04:05Z</date>
    <key>nested</key>
    <dict>
        <key>count</key>
        <integer>3</integer>
    </dict>
</dict>
</plist>"#;

    #[test]
    fn test_to_json() {
        let json = to_json(&parse(DOMAIN));
        assert_eq!(json["autohide"], json!(true));
        assert_eq!(json["tilesize"], json!(48.0));
        assert_eq!(json["persistent-apps"], json!(["Safari"]));
        assert_eq!(json["lastSeen"], json!({"$date": "2024-01-02T03:04:05Z"}));
        assert_eq!(json["nested"], json!({"count": 3}));
    }

    #[test]
    fn test_to_plist() {
        assert!(to_plist(&Value::Null).unwrap().is_none());
        assert_eq!(
            to_plist(&json!({"a": [1, 2.5, "s", false]})).unwrap(),
            Some(plist::Value::Dictionary(Dictionary::from_iter([(
                "a".to_string(),
                plist::Value::Array(vec![
                    plist::Value::Integer(1.into()),
                    plist::Value::Real(2.5),
                    plist::Value::String("s".into()),
                    plist::Value::Boolean(false),
                ]),
            )])))
        );
        assert!(to_plist(&json!([1, null])).is_err());
    }

    #[test]
    fn test_dates_and_data_survive_a_json_round_trip() {
        let original = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<array>
    <date>2024-01-02T03:04:05Z</date>
    <data>AAEC/w==</data>
    <dict>
        <key>added</key>
        <date>2023-06-07T08:09:10Z</date>
    </dict>
</array>
</plist>"#,
        );

        let json = to_json(&original);
        assert_eq!(json[1], json!({"$data": [0, 1, 2, 255]}));
        assert_eq!(to_plist(&json).unwrap(), Some(original));
    }

    #[test]
    fn test_array_merge_keeps_dates() {
        // what array_contains computes: the read array plus one element
        let current = to_json(&parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><array><dict><key>at</key><date>2024-01-02T03:04:05Z</date></dict></array></plist>"#,
        ));
        let mut merged = current.as_array().unwrap().clone();
        merged.push(json!("new"));

        let plist = to_plist(&Value::Array(merged)).unwrap().unwrap();
        let items = plist.as_array().unwrap();
        let entry = items[0].as_dictionary().unwrap();
        assert!(matches!(entry.get("at"), Some(plist::Value::Date(_))));
        assert_eq!(items[1], plist::Value::String("new".into()));
    }

    #[test]
    fn test_invalid_tagged_values() {
        assert!(to_plist(&json!({"$date": "yesterday"})).is_err());
        assert!(to_plist(&json!({"$data": [256]})).is_err());
        // extra keys make it an ordinary dictionary
        assert!(matches!(
            to_plist(&json!({"$date": "x", "other": 1})).unwrap(),
            Some(plist::Value::Dictionary(_))
        ));
    }

    #[test]
    fn test_assign_keeps_untouched_types() {
        let mut doc = parse(DOMAIN);
        assign(
            &mut doc,
            &path(&["nested", "count"]),
            Some(plist::Value::Integer(4.into())),
        );

        let dict = doc.as_dictionary().unwrap();
        assert!(matches!(dict.get("lastSeen"), Some(plist::Value::Date(_))));
        assert_eq!(to_json(&doc)["nested"]["count"], json!(4));
    }

    #[test]
    fn test_assign_creates_and_removes() {
        let mut doc = plist::Value::Dictionary(Dictionary::new());
        assign(
            &mut doc,
            &path(&["a", "b"]),
            Some(plist::Value::Boolean(true)),
        );
        assert_eq!(to_json(&doc), json!({"a": {"b": true}}));

        assign(&mut doc, &path(&["a", "b"]), None);
        assert_eq!(to_json(&doc), json!({"a": {}}));

        // removing below a missing parent creates nothing
        assign(&mut doc, &path(&["x", "y"]), None);
        assert_eq!(to_json(&doc), json!({"a": {}}));
    }

    #[test]
    fn test_values_equal_aliases_bools_and_numbers() {
        let adapter = DefaultsAdapter::new();
        assert!(adapter.values_equal(&json!(1), &json!(true)));
        assert!(adapter.values_equal(&json!(false), &json!(0)));
        assert!(!adapter.values_equal(&json!(2), &json!(true)));
        assert!(adapter.values_equal(&json!(48.0), &json!(48)));
        assert!(!adapter.values_equal(&json!("1"), &json!(true)));
        assert!(adapter.values_equal(&json!(["a"]), &json!(["a"])));
    }

    #[test]
    fn test_key_needs_a_path() {
        let adapter = DefaultsAdapter::new();
        assert!(adapter.read(&json!("com.apple.dock"), &Options::new()).is_err());
    }
}
