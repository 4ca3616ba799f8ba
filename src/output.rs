//! JSON rendering of Focal values.
//!
//! The CLI and report surfaces render evaluation results as JSON. Output
//! is deterministic: set entries are sorted by name, and the scalar kinds
//! without a JSON counterpart (percent, duration, time) render as their
//! canonical textual form.

use serde_json::{Map, Number};

use crate::value::Value;

/// Convert a value to its JSON representation.
pub fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::None => serde_json::Value::Null,
        Value::Empty => serde_json::Value::Array(Vec::new()),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::Number(Number::from(*n)),
        Value::Float(n) => match Number::from_f64(*n) {
            Some(number) => serde_json::Value::Number(number),
            None => serde_json::Value::Null,
        },
        Value::Percent(_) | Value::Duration(_) | Value::Time(_) => {
            serde_json::Value::String(value.to_string())
        }
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(json_value).collect()),
        Value::Set(entries) => {
            if entries.iter().all(|e| e.name.is_some()) {
                let mut sorted: Vec<_> = entries.iter().collect();
                sorted.sort_by(|a, b| a.name.cmp(&b.name));
                let mut map = Map::new();
                for entry in sorted {
                    if let Some(name) = &entry.name {
                        map.insert(name.clone(), json_value(&entry.value));
                    }
                }
                serde_json::Value::Object(map)
            } else {
                serde_json::Value::Array(entries.iter().map(|e| json_value(&e.value)).collect())
            }
        }
        Value::Function(_) | Value::Series(_) => serde_json::Value::String(value.to_string()),
    }
}

/// Compact JSON string.
pub fn to_json(value: &Value) -> String {
    serde_json::to_string(&json_value(value)).expect("value rendering cannot fail")
}

/// Pretty-printed JSON string.
pub fn to_json_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(&json_value(value)).expect("value rendering cannot fail")
}
