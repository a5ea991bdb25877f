//! Binding raw call arguments onto a schema.
//!
//! The binder never logs and never returns a partial result: either every
//! schema entry is resolved and checked, or one [`BindError`] lists every
//! problem with the call.

use std::collections::HashSet;
use std::sync::Arc;

use startosis_core::{DefectError, Value};

use crate::argument::BuiltinArgument;
use crate::error::{ArgumentViolation, BindError, ViolationReason};
use crate::values_set::ArgumentValuesSet;

enum Slot {
    Empty,
    Filled(Value),
    Conflict,
}

/// Check that every argument name in a schema is declared once.
pub fn check_schema(builtin: &str, definitions: &[BuiltinArgument]) -> Result<(), DefectError> {
    let mut seen = HashSet::with_capacity(definitions.len());
    for definition in definitions {
        if !seen.insert(definition.name) {
            return Err(DefectError::new(format!(
                "Argument '{}' is declared more than once in the schema of '{}'",
                definition.name, builtin
            )));
        }
    }
    Ok(())
}

/// Bind positional and keyword arguments for `builtin`.
///
/// Positional values fill schema entries in declaration order; keywords
/// fill entries by name. Violations are reported in declaration order,
/// followed by unknown keywords and then excess positional values.
pub fn bind(
    builtin: &str,
    definitions: &Arc<[BuiltinArgument]>,
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
) -> Result<ArgumentValuesSet, BindError> {
    let mut slots: Vec<Slot> = definitions.iter().map(|_| Slot::Empty).collect();
    let mut trailing = Vec::new();

    let given = positional.len();
    for (idx, value) in positional.into_iter().enumerate() {
        match slots.get_mut(idx) {
            Some(slot) => *slot = Slot::Filled(value),
            None => {
                trailing.push(ArgumentViolation::new(
                    format!("#{}", idx + 1),
                    ViolationReason::TooManyPositional {
                        given,
                        max: definitions.len(),
                    },
                ));
                break;
            }
        }
    }

    let mut unknown = Vec::new();
    for (name, value) in named {
        match definitions.iter().position(|d| d.name == name) {
            Some(idx) => {
                slots[idx] = match slots[idx] {
                    Slot::Empty => Slot::Filled(value),
                    Slot::Filled(_) | Slot::Conflict => Slot::Conflict,
                }
            }
            None => unknown.push(ArgumentViolation::new(name, ViolationReason::UnknownKeyword)),
        }
    }

    let mut violations = Vec::new();
    let mut values = Vec::with_capacity(definitions.len());
    for (definition, slot) in definitions.iter().zip(slots) {
        match slot {
            Slot::Empty => {
                if !definition.is_optional {
                    violations.push(ArgumentViolation::new(
                        definition.name,
                        ViolationReason::Missing,
                    ));
                }
                values.push(None);
            }
            Slot::Conflict => {
                violations.push(ArgumentViolation::new(
                    definition.name,
                    ViolationReason::Duplicate,
                ));
                values.push(None);
            }
            Slot::Filled(value) => {
                if let Some(reason) = check(definition, &value) {
                    violations.push(ArgumentViolation::new(definition.name, reason));
                }
                values.push(Some(value));
            }
        }
    }
    violations.extend(unknown);
    violations.extend(trailing);

    if !violations.is_empty() {
        return Err(BindError {
            builtin: builtin.to_string(),
            violations,
        });
    }

    ArgumentValuesSet::new(definitions.clone(), values).map_err(|err| BindError {
        builtin: builtin.to_string(),
        violations: vec![ArgumentViolation::new(
            builtin,
            ViolationReason::Invalid {
                message: err.to_string(),
            },
        )],
    })
}

fn check(definition: &BuiltinArgument, value: &Value) -> Option<ViolationReason> {
    if !definition.kind.accepts(value) {
        return Some(ViolationReason::TypeMismatch {
            expected: definition.kind.to_string(),
            actual: value.type_name().to_string(),
        });
    }
    let validator = definition.validator?;
    validator(value, definition.name)
        .err()
        .map(|err| ViolationReason::Invalid {
            message: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ArgumentKind;
    use crate::validators;

    fn schema() -> Arc<[BuiltinArgument]> {
        Arc::from(vec![
            BuiltinArgument::required("name", ArgumentKind::STRING)
                .with_validator(validators::non_empty_string),
            BuiltinArgument::required("count", ArgumentKind::INT),
            BuiltinArgument::optional("tag", ArgumentKind::STRING),
        ])
    }

    fn named(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_positional_and_named() {
        let set = bind(
            "f",
            &schema(),
            vec![Value::from("x")],
            named(&[("count", Value::from(3))]),
        )
        .unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.extract::<i64>("count").unwrap(), 3);
        assert!(!set.is_set("tag"));
    }

    #[test]
    fn test_schema_names_must_be_unique() {
        assert!(check_schema("f", &schema()).is_ok());

        let repeated = vec![
            BuiltinArgument::required("name", ArgumentKind::STRING),
            BuiltinArgument::optional("name", ArgumentKind::STRING),
        ];
        let err = check_schema("f", &repeated).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Argument 'name' is declared more than once in the schema of 'f'"));
    }

    #[test]
    fn test_missing_argument() {
        let err = bind("f", &schema(), vec![Value::from("x")], vec![]).unwrap_err();
        assert_eq!(err.arguments(), vec!["count"]);
        assert_eq!(err.violations[0].reason, ViolationReason::Missing);
    }

    #[test]
    fn test_type_mismatches_are_batched() {
        let err = bind(
            "f",
            &schema(),
            vec![],
            named(&[("count", Value::from("3")), ("name", Value::from(1))]),
        )
        .unwrap_err();
        assert_eq!(err.arguments(), vec!["name", "count"]);
    }

    #[test]
    fn test_validator_runs_after_kind_check() {
        let err = bind("f", &schema(), vec![Value::from(""), Value::from(1)], vec![]).unwrap_err();
        assert!(matches!(err.violations[0].reason, ViolationReason::Invalid { .. }));
    }

    #[test]
    fn test_unknown_duplicate_and_excess() {
        let err = bind(
            "f",
            &schema(),
            vec![
                Value::from("a"),
                Value::from(1),
                Value::from("t"),
                Value::from("extra"),
            ],
            named(&[("name", Value::from("b")), ("colour", Value::from("red"))]),
        )
        .unwrap_err();
        assert_eq!(err.arguments(), vec!["name", "colour", "#4"]);
        assert_eq!(err.violations[0].reason, ViolationReason::Duplicate);
        assert_eq!(err.violations[1].reason, ViolationReason::UnknownKeyword);
        assert_eq!(
            err.violations[2].reason,
            ViolationReason::TooManyPositional { given: 4, max: 3 }
        );
    }
}
