//! JSON projection of script values, used when values leave the script
//! layer inside serializable records.

use num_traits::ToPrimitive;
use serde_json::{json, Map, Number};

use crate::stringify::stringify;
use crate::value::Value;

/// Project a value onto JSON.
///
/// Ints outside the 64-bit range, non-finite floats, times and durations
/// are carried as their script text. Dicts with non-string keys become
/// arrays of `[key, value]` pairs.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => {
            if let Some(n) = i.to_i64() {
                json!(n)
            } else if let Some(n) = i.to_u64() {
                json!(n)
            } else {
                serde_json::Value::String(i.to_string())
            }
        }
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(stringify(value))),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Bytes(b) => json!(b.to_vec()),
        Value::Time(t) => serde_json::Value::String(t.to_rfc3339()),
        Value::Duration(d) => serde_json::Value::String(d.to_string()),
        Value::List(items) => {
            serde_json::Value::Array(items.borrow().iter().map(to_json).collect())
        }
        Value::Tuple(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Set(items) => serde_json::Value::Array(items.borrow().iter().map(to_json).collect()),
        Value::Dict(dict) => {
            let dict = dict.borrow();
            if dict.keys().all(|k| k.as_str().is_some()) {
                let mut map = Map::new();
                for (key, value) in dict.iter() {
                    map.insert(key.as_str().unwrap_or_default().to_string(), to_json(value));
                }
                serde_json::Value::Object(map)
            } else {
                serde_json::Value::Array(
                    dict.iter()
                        .map(|(k, v)| json!([to_json(k), to_json(v)]))
                        .collect(),
                )
            }
        }
        Value::Record(record) => {
            let mut map = Map::new();
            for (name, value) in record.fields() {
                map.insert(name.to_string(), to_json(value));
            }
            serde_json::Value::Object(map)
        }
        Value::Extension(ext) => {
            let mut fields = Map::new();
            for (name, value) in ext.fields() {
                fields.insert(name, to_json(&value));
            }
            json!({ "type": ext.type_name(), "fields": fields })
        }
    }
}
