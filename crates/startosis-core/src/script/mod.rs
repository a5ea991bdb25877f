//! Reader for the literal script syntax produced by
//! [`stringify`](crate::stringify::stringify).
//!
//! Supports literals, lists, tuples, dicts, `set([...])`, `float("nan")`,
//! `time.from_timestamp(...)`, `time.parse_duration(...)` and named
//! constructor calls. Constructor calls are handed to a [`CallResolver`].

mod lexer;
mod parser;

use crate::error::{Result, StartosisError};
use crate::value::{Record, Value};

/// Resolves `Name(args...)` calls found while reading script text.
pub trait CallResolver {
    /// Build the value for a call. `name` may be dotted (`module.fn`).
    fn resolve_call(
        &self,
        name: &str,
        positional: Vec<Value>,
        named: Vec<(String, Value)>,
    ) -> Result<Value>;
}

/// Resolves every call to a [`Record`] built from its keyword arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordResolver;

impl CallResolver for RecordResolver {
    fn resolve_call(
        &self,
        name: &str,
        positional: Vec<Value>,
        named: Vec<(String, Value)>,
    ) -> Result<Value> {
        if !positional.is_empty() {
            return Err(StartosisError::interpretation(format!(
                "{}: unexpected positional arguments",
                name
            )));
        }
        Ok(Value::record(Record::new(name, named)?))
    }
}

/// Read a single value from script text.
pub fn parse_value(text: &str, resolver: &dyn CallResolver) -> Result<Value> {
    let tokens = lexer::tokenize(text)?;
    parser::Parser::new(tokens, resolver).parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::ScriptDuration;
    use crate::stringify::stringify;
    use chrono::{TimeZone, Utc};
    use num_bigint::BigInt;

    fn read(text: &str) -> Value {
        parse_value(text, &RecordResolver).unwrap()
    }

    #[test]
    fn test_nesting_is_bounded() {
        let depth = parser::MAX_NESTING_DEPTH;
        let nested = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        assert!(parse_value(&nested, &RecordResolver).is_ok());

        let too_deep = "[".repeat(100_000);
        let err = parse_value(&too_deep, &RecordResolver).unwrap_err();
        assert!(err.is_interpretation());
        assert!(err.to_string().contains("nesting exceeds 256 levels"));

        let negations = format!("{}1", "-".repeat(depth + 1));
        assert!(parse_value(&negations, &RecordResolver).is_err());
    }

    #[test]
    fn test_literals() {
        assert_eq!(read("None"), Value::None);
        assert_eq!(read("True"), Value::from(true));
        assert_eq!(read("-7"), Value::from(-7));
        assert_eq!(read("2.5"), Value::from(2.5));
        assert_eq!(read("'single'"), Value::from("single"));
        assert_eq!(read("b\"\\x00\""), Value::bytes(vec![0]));
    }

    #[test]
    fn test_containers() {
        assert_eq!(
            read("[1, (2,), {\"k\": [3]}]"),
            Value::list(vec![
                Value::from(1),
                Value::tuple(vec![Value::from(2)]),
                Value::dict_from([(Value::from("k"), Value::list(vec![Value::from(3)]))])
                    .unwrap(),
            ])
        );
        assert_eq!(read("(1)"), Value::from(1));
        assert_eq!(read("[1, 2,]"), Value::list(vec![Value::from(1), Value::from(2)]));
    }

    #[test]
    fn test_builtin_calls() {
        assert_eq!(
            read("set([1, 2])"),
            Value::set_from([Value::from(2), Value::from(1)]).unwrap()
        );
        assert!(read("float(\"nan\")").as_float().unwrap().is_nan());
        assert_eq!(
            read("time.parse_duration(\"15m0s\")"),
            Value::from(ScriptDuration::from_mins(15))
        );
        assert_eq!(
            read("time.from_timestamp(10, 5)"),
            Value::from(Utc.timestamp_opt(10, 5).unwrap())
        );
    }

    #[test]
    fn test_records() {
        let value = read("struct(a=1, b=\"x\")");
        assert_eq!(value.attr("a").unwrap(), Value::from(1));
        assert_eq!(stringify(&value), "struct(a=1, b=\"x\")");
    }

    #[test]
    fn test_big_ints() {
        let value = read("-123456789012345678901234567890");
        let expected = -BigInt::parse_bytes(b"123456789012345678901234567890", 10).unwrap();
        assert_eq!(value, Value::Int(expected));
    }

    #[test]
    fn test_errors() {
        for text in ["[1, 2", "{1 2}", "struct(a=1, 2)", "1 2", "-\"x\"", "set(1)", "@"] {
            assert!(parse_value(text, &RecordResolver).is_err(), "{text} should fail");
        }
        assert!(parse_value("struct(1)", &RecordResolver).is_err());
    }
}
