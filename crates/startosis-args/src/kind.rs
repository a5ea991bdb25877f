//! Declared argument types.

use std::fmt;

use chrono::{DateTime, Utc};
use startosis_core::{Dict, ScriptDuration, Set, Value, ValueKind};

/// The type an argument accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// Any value, checked by the validator if at all.
    Any,
    /// Any value supporting ordering comparisons.
    Comparable,
    /// Exactly one built-in kind.
    Of(ValueKind),
    /// An extension value with the given type name.
    Composite(&'static str),
}

impl ArgumentKind {
    pub const STRING: ArgumentKind = ArgumentKind::Of(ValueKind::String);
    pub const INT: ArgumentKind = ArgumentKind::Of(ValueKind::Int);
    pub const FLOAT: ArgumentKind = ArgumentKind::Of(ValueKind::Float);
    pub const BOOL: ArgumentKind = ArgumentKind::Of(ValueKind::Bool);
    pub const LIST: ArgumentKind = ArgumentKind::Of(ValueKind::List);
    pub const DICT: ArgumentKind = ArgumentKind::Of(ValueKind::Dict);

    /// Returns true if `value` is assignable to this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ArgumentKind::Any => true,
            ArgumentKind::Comparable => value.kind().is_comparable(),
            ArgumentKind::Of(kind) => value.kind() == *kind,
            ArgumentKind::Composite(type_name) => value
                .as_extension()
                .map_or(false, |ext| ext.type_name() == *type_name),
        }
    }

    /// The value an omitted optional argument resolves to.
    pub fn zero_value(&self) -> Value {
        match self {
            ArgumentKind::Of(kind) => match kind {
                ValueKind::Bool => Value::Bool(false),
                ValueKind::Int => Value::from(0),
                ValueKind::Float => Value::Float(0.0),
                ValueKind::String => Value::from(""),
                ValueKind::Bytes => Value::bytes(Vec::new()),
                ValueKind::Time => Value::Time(DateTime::<Utc>::default()),
                ValueKind::Duration => Value::Duration(ScriptDuration::ZERO),
                ValueKind::List => Value::list(Vec::new()),
                ValueKind::Tuple => Value::tuple(Vec::new()),
                ValueKind::Set => Value::set(Set::new()),
                ValueKind::Dict => Value::dict(Dict::new()),
                ValueKind::None | ValueKind::Record | ValueKind::Extension => Value::None,
            },
            ArgumentKind::Any | ArgumentKind::Comparable | ArgumentKind::Composite(_) => {
                Value::None
            }
        }
    }
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentKind::Any => f.write_str("value"),
            ArgumentKind::Comparable => f.write_str("comparable value"),
            ArgumentKind::Of(kind) => f.write_str(kind.type_name()),
            ArgumentKind::Composite(type_name) => f.write_str(type_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts() {
        assert!(ArgumentKind::STRING.accepts(&Value::from("x")));
        assert!(!ArgumentKind::STRING.accepts(&Value::from(1)));
        assert!(ArgumentKind::Any.accepts(&Value::None));
        assert!(!ArgumentKind::Comparable.accepts(&Value::None));
        assert!(!ArgumentKind::Composite("PortSpec").accepts(&Value::from(80)));
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(ArgumentKind::STRING.zero_value(), Value::from(""));
        assert_eq!(ArgumentKind::INT.zero_value(), Value::from(0));
        assert_eq!(ArgumentKind::Composite("User").zero_value(), Value::None);
        assert_eq!(ArgumentKind::LIST.zero_value(), Value::list(vec![]));
    }

    #[test]
    fn test_display() {
        assert_eq!(ArgumentKind::DICT.to_string(), "dict");
        assert_eq!(ArgumentKind::Composite("PortSpec").to_string(), "PortSpec");
    }
}
