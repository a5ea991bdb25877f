//! Conversions from bound values into plain Rust collections.

use std::collections::BTreeMap;

use startosis_core::{InterpretationError, Value};

/// The value as an owned string.
pub fn safe_cast_to_string(value: &Value, attr: &str) -> Result<String, InterpretationError> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        InterpretationError::new(format!(
            "'{}' is expected to be a string. Got {}",
            attr,
            value.type_name()
        ))
    })
}

/// A list (or tuple) of strings.
pub fn safe_cast_to_string_list(
    value: &Value,
    attr: &str,
) -> Result<Vec<String>, InterpretationError> {
    let items: Vec<Value> = match value {
        Value::List(list) => list.borrow().clone(),
        Value::Tuple(items) => items.to_vec(),
        other => {
            return Err(InterpretationError::new(format!(
                "'{}' argument is expected to be a list. Got {}",
                attr,
                other.type_name()
            )))
        }
    };
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                InterpretationError::new(format!(
                    "'{}' argument is expected to be a list of strings. Got element {} of type {}",
                    attr,
                    idx,
                    item.type_name()
                ))
            })
        })
        .collect()
}

/// A dict of strings to strings.
pub fn safe_cast_to_string_map(
    value: &Value,
    attr: &str,
) -> Result<BTreeMap<String, String>, InterpretationError> {
    let dict = value.as_dict().ok_or_else(|| {
        InterpretationError::new(format!(
            "Attribute '{}' is expected to be a dictionary of strings, got '{}'",
            attr,
            value.type_name()
        ))
    })?;
    let dict = dict.borrow();
    let mut out = BTreeMap::new();
    for (key, item) in dict.iter() {
        let key = key.as_str().ok_or_else(|| {
            InterpretationError::new(format!(
                "Key in '{}' dictionary was expected to be a string, got '{}'",
                attr,
                key.type_name()
            ))
        })?;
        let item = item.as_str().ok_or_else(|| {
            InterpretationError::new(format!(
                "Value associated to key '{}' in dictionary '{}' was expected to be a string, got '{}'",
                key,
                attr,
                item.type_name()
            ))
        })?;
        out.insert(key.to_string(), item.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_list() {
        let list = Value::list(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(safe_cast_to_string_list(&list, "cmd").unwrap(), vec!["a", "b"]);

        let bad = Value::list(vec![Value::from("a"), Value::from(1)]);
        let err = safe_cast_to_string_list(&bad, "cmd").unwrap_err();
        assert!(err.message().contains("element 1"));
    }

    #[test]
    fn test_string_map() {
        let dict = Value::dict_from([(Value::from("b"), Value::from("2")), (Value::from("a"), Value::from("1"))])
            .unwrap();
        let map = safe_cast_to_string_map(&dict, "env_vars").unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);

        let bad = Value::dict_from([(Value::from("a"), Value::from(1))]).unwrap();
        assert!(safe_cast_to_string_map(&bad, "env_vars").is_err());
    }
}
