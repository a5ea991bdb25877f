//! Canonical script text for values.
//!
//! The output is valid script syntax: reading it back with
//! [`parse_value`](crate::script::parse_value) yields a value deep-equal to
//! the input. Dict entries and set elements are sorted by their rendered
//! text so the output does not depend on insertion order.

use std::fmt::{self, Write};
use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::value::Value;

/// Render a value as canonical script text.
pub fn stringify(value: &Value) -> String {
    let mut out = String::new();
    Stringifier::default().write_value(&mut out, value);
    out
}

/// Quote a string the way script literals are written.
pub fn quote_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn quote_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() + 3);
    out.push_str("b\"");
    for &byte in data {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\x{:02x}", byte);
            }
        }
    }
    out.push('"');
    out
}

/// Render a float so that it reads back as the same float.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        "float(\"nan\")".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "float(\"+inf\")".to_string()
        } else {
            "float(\"-inf\")".to_string()
        }
    } else {
        // Debug output is the shortest text that round-trips and always
        // carries a '.' or an exponent.
        format!("{:?}", f)
    }
}

fn format_time(t: &DateTime<Utc>) -> String {
    let nanos = t.timestamp_subsec_nanos();
    if nanos == 0 {
        format!("time.from_timestamp({})", t.timestamp())
    } else {
        format!("time.from_timestamp({}, {})", t.timestamp(), nanos)
    }
}

#[derive(Default)]
struct Stringifier {
    // Containers currently being rendered; re-entering one renders `...`.
    open: Vec<*const ()>,
}

impl Stringifier {
    fn write_value(&mut self, out: &mut String, value: &Value) {
        match value {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(i) => {
                let _ = write!(out, "{}", i);
            }
            Value::Float(f) => out.push_str(&format_float(*f)),
            Value::String(s) => out.push_str(&quote_string(s)),
            Value::Bytes(b) => out.push_str(&quote_bytes(b)),
            Value::Time(t) => out.push_str(&format_time(t)),
            Value::Duration(d) => {
                out.push_str("time.parse_duration(");
                out.push_str(&quote_string(&d.to_string()));
                out.push(')');
            }
            Value::List(list) => {
                let id = Rc::as_ptr(list) as *const ();
                if self.open.contains(&id) {
                    out.push_str("[...]");
                    return;
                }
                self.open.push(id);
                out.push('[');
                self.write_sequence(out, list.borrow().iter());
                out.push(']');
                self.open.pop();
            }
            Value::Tuple(items) => {
                out.push('(');
                self.write_sequence(out, items.iter());
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Value::Set(set) => {
                let mut rendered: Vec<String> =
                    set.borrow().iter().map(|v| self.render(v)).collect();
                rendered.sort();
                out.push_str("set([");
                out.push_str(&rendered.join(", "));
                out.push_str("])");
            }
            Value::Dict(dict) => {
                let id = Rc::as_ptr(dict) as *const ();
                if self.open.contains(&id) {
                    out.push_str("{...}");
                    return;
                }
                self.open.push(id);
                let mut entries: Vec<(String, String)> = dict
                    .borrow()
                    .iter()
                    .map(|(k, v)| (self.render(k), self.render(v)))
                    .collect();
                entries.sort();
                out.push('{');
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key);
                    out.push_str(": ");
                    out.push_str(value);
                }
                out.push('}');
                self.open.pop();
            }
            Value::Record(record) => {
                self.write_call(out, record.constructor(), record.fields());
            }
            Value::Extension(ext) => {
                let fields = ext.fields();
                self.write_call(
                    out,
                    ext.type_name(),
                    fields.iter().map(|(name, v)| (name.as_str(), v)),
                );
            }
        }
    }

    fn render(&mut self, value: &Value) -> String {
        let mut out = String::new();
        self.write_value(&mut out, value);
        out
    }

    fn write_sequence<'a>(&mut self, out: &mut String, items: impl Iterator<Item = &'a Value>) {
        for (idx, item) in items.enumerate() {
            if idx > 0 {
                out.push_str(", ");
            }
            self.write_value(out, item);
        }
    }

    fn write_call<'a>(
        &mut self,
        out: &mut String,
        name: &str,
        fields: impl Iterator<Item = (&'a str, &'a Value)>,
    ) {
        out.push_str(name);
        out.push('(');
        for (idx, (field, value)) in fields.enumerate() {
            if idx > 0 {
                out.push_str(", ");
            }
            out.push_str(field);
            out.push('=');
            self.write_value(out, value);
        }
        out.push(')');
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stringify(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::ScriptDuration;
    use crate::value::Record;
    use chrono::TimeZone;

    #[test]
    fn test_scalars() {
        assert_eq!(stringify(&Value::None), "None");
        assert_eq!(stringify(&Value::from(true)), "True");
        assert_eq!(stringify(&Value::from(-42)), "-42");
        assert_eq!(stringify(&Value::from(1.0)), "1.0");
        assert_eq!(stringify(&Value::from(f64::NAN)), "float(\"nan\")");
        assert_eq!(stringify(&Value::from("a\"b\n")), "\"a\\\"b\\n\"");
        assert_eq!(stringify(&Value::bytes(vec![b'h', 0xff])), "b\"h\\xff\"");
    }

    #[test]
    fn test_time_and_duration() {
        let t = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(stringify(&Value::from(t)), "time.from_timestamp(1700000000)");
        let d = ScriptDuration::from_secs(5400);
        assert_eq!(
            stringify(&Value::from(d)),
            "time.parse_duration(\"1h30m0s\")"
        );
    }

    #[test]
    fn test_tuples() {
        assert_eq!(stringify(&Value::tuple(vec![])), "()");
        assert_eq!(stringify(&Value::tuple(vec![Value::from(1)])), "(1,)");
        assert_eq!(
            stringify(&Value::tuple(vec![Value::from(1), Value::from(2)])),
            "(1, 2)"
        );
    }

    #[test]
    fn test_dict_keys_sorted() {
        let dict = Value::dict_from([
            (Value::from("z"), Value::from(1)),
            (Value::from("a"), Value::list(vec![Value::from(2)])),
        ])
        .unwrap();
        assert_eq!(stringify(&dict), "{\"a\": [2], \"z\": 1}");
    }

    #[test]
    fn test_set_sorted() {
        let set = Value::set_from([Value::from(3), Value::from(1)]).unwrap();
        assert_eq!(stringify(&set), "set([1, 3])");
    }

    #[test]
    fn test_record() {
        let record = Record::new(
            "struct",
            [("name", Value::from("db")), ("port", Value::from(5432))],
        )
        .unwrap();
        assert_eq!(
            stringify(&Value::record(record)),
            "struct(name=\"db\", port=5432)"
        );
    }

    #[test]
    fn test_cyclic_list() {
        let list = Value::list(vec![Value::from(1)]);
        list.as_list().unwrap().borrow_mut().push(list.clone());
        assert_eq!(stringify(&list), "[1, [...]]");
    }
}
