//! Typed views over dynamic values.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::duration::ScriptDuration;
use crate::extension::Extension;
use crate::value::{DictRef, ListRef, Record, SetRef, Value};

/// Conversion from a dynamic value into a concrete Rust type.
///
/// `from_value` returns `None` when the stored kind is not assignable to
/// `Self`; callers turn that into a type mismatch diagnostic.
pub trait FromValue: Sized {
    /// Label for the expected type in mismatch diagnostics.
    fn expected() -> String;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn expected() -> String {
        "value".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn expected() -> String {
        format!("{} or None", T::expected())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::None => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for bool {
    fn expected() -> String {
        "bool".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for BigInt {
    fn expected() -> String {
        "int".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int().cloned()
    }
}

macro_rules! int_from_value {
    ($($ty:ty => $convert:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn expected() -> String {
                    format!("int in {} range", stringify!($ty))
                }

                fn from_value(value: &Value) -> Option<Self> {
                    value.as_int()?.$convert()
                }
            }
        )*
    };
}

int_from_value!(i64 => to_i64, u64 => to_u64, u32 => to_u32, u16 => to_u16);

impl FromValue for f64 {
    fn expected() -> String {
        "float".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }
}

impl FromValue for String {
    fn expected() -> String {
        "string".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for Rc<str> {
    fn expected() -> String {
        "string".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    fn expected() -> String {
        "bytes".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b.to_vec()),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn expected() -> String {
        "time.time".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl FromValue for ScriptDuration {
    fn expected() -> String {
        "time.duration".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }
}

impl FromValue for ListRef {
    fn expected() -> String {
        "list".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_list().cloned()
    }
}

impl FromValue for DictRef {
    fn expected() -> String {
        "dict".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_dict().cloned()
    }
}

impl FromValue for SetRef {
    fn expected() -> String {
        "set".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Set(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for Rc<[Value]> {
    fn expected() -> String {
        "tuple".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Tuple(items) => Some(items.clone()),
            _ => None,
        }
    }
}

impl FromValue for Rc<Record> {
    fn expected() -> String {
        "struct".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Record(r) => Some(r.clone()),
            _ => None,
        }
    }
}

impl FromValue for Rc<dyn Extension> {
    fn expected() -> String {
        "extension".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_extension().cloned()
    }
}

/// Any value that supports ordering comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparable(pub Value);

impl FromValue for Comparable {
    fn expected() -> String {
        "comparable value".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        value
            .kind()
            .is_comparable()
            .then(|| Comparable(value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_extraction() {
        assert_eq!(String::from_value(&Value::from("x")), Some("x".to_string()));
        assert_eq!(bool::from_value(&Value::from(1)), None);
        assert_eq!(u16::from_value(&Value::from(80)), Some(80));
        assert_eq!(u16::from_value(&Value::from(70000)), None);
        assert_eq!(u64::from_value(&Value::from(-1)), None);
    }

    #[test]
    fn test_option_accepts_none() {
        assert_eq!(Option::<String>::from_value(&Value::None), Some(None));
        assert_eq!(
            Option::<String>::from_value(&Value::from("a")),
            Some(Some("a".to_string()))
        );
        assert_eq!(Option::<String>::from_value(&Value::from(1)), None);
        assert_eq!(Option::<String>::expected(), "string or None");
    }

    #[test]
    fn test_comparable() {
        assert!(Comparable::from_value(&Value::from(3)).is_some());
        assert!(Comparable::from_value(&Value::None).is_none());
    }

    #[test]
    fn test_list_extraction_aliases() {
        let list = Value::list(vec![]);
        let handle = ListRef::from_value(&list).unwrap();
        handle.borrow_mut().push(Value::None);
        assert_eq!(list.as_list().unwrap().borrow().len(), 1);
    }
}
