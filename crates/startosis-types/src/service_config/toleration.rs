//! `Toleration(key?, operator?, value?, effect?, toleration_seconds?)`.

use startosis_args::{validators, ArgumentKind, BuiltinArgument};
use startosis_core::{InterpretationError, Result, StartosisError, Value};

use crate::constructor::kurtosis_value_type;
use crate::records::{TolerationEffect, TolerationOperator, TolerationRecord};

pub const TOLERATION_TYPE_NAME: &str = "Toleration";

pub const KEY_ATTR: &str = "key";
pub const OPERATOR_ATTR: &str = "operator";
pub const VALUE_ATTR: &str = "value";
pub const EFFECT_ATTR: &str = "effect";
pub const TOLERATION_SECONDS_ATTR: &str = "toleration_seconds";

fn validate_operator(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    validators::string_values(value, name, TolerationOperator::NAMES)
}

fn validate_effect(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    validators::string_values(value, name, TolerationEffect::NAMES)
}

fn validate_seconds(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    validators::int64_in_range(value, name, 0, i64::MAX)
}

fn toleration_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::optional(KEY_ATTR, ArgumentKind::STRING),
        BuiltinArgument::optional(OPERATOR_ATTR, ArgumentKind::STRING)
            .with_validator(validate_operator),
        BuiltinArgument::optional(VALUE_ATTR, ArgumentKind::STRING),
        BuiltinArgument::optional(EFFECT_ATTR, ArgumentKind::STRING).with_validator(validate_effect),
        BuiltinArgument::optional(TOLERATION_SECONDS_ATTR, ArgumentKind::INT)
            .with_validator(validate_seconds),
    ]
}

kurtosis_value_type!(
    /// Lets a service schedule onto nodes carrying a matching taint.
    Toleration,
    TOLERATION_TYPE_NAME,
    toleration_arguments
);

impl Toleration {
    pub fn to_kurtosis_type(&self) -> Result<TolerationRecord> {
        let key: String = self.base.attr_value_or_default(KEY_ATTR)?;
        let value: String = self.base.attr_value_or_default(VALUE_ATTR)?;

        let operator = match self.base.extract_attr_value::<String>(OPERATOR_ATTR)? {
            None => TolerationOperator::default(),
            Some(text) => TolerationOperator::parse(&text).ok_or_else(|| {
                StartosisError::interpretation(format!(
                    "Invalid toleration operator '{}'. Valid values are {}",
                    text,
                    TolerationOperator::NAMES.join(", ")
                ))
            })?,
        };
        if operator == TolerationOperator::Exists && !value.is_empty() {
            return Err(StartosisError::interpretation(format!(
                "Toleration with operator 'Exists' cannot have a value, got '{}'",
                value
            )));
        }

        let effect = match self.base.extract_attr_value::<String>(EFFECT_ATTR)? {
            None => None,
            Some(text) => Some(TolerationEffect::parse(&text).ok_or_else(|| {
                StartosisError::interpretation(format!(
                    "Invalid toleration effect '{}'. Valid values are {}",
                    text,
                    TolerationEffect::NAMES.join(", ")
                ))
            })?),
        };

        Ok(TolerationRecord {
            key,
            operator,
            value,
            effect,
            toleration_seconds: self.base.extract_attr_value(TOLERATION_SECONDS_ATTR)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructor::KurtosisValueType;

    fn toleration(pairs: &[(&str, Value)]) -> Toleration {
        Toleration::create(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let record = toleration(&[]).to_kurtosis_type().unwrap();
        assert_eq!(record.operator, TolerationOperator::Equal);
        assert_eq!(record.effect, None);
        assert_eq!(record.key, "");
    }

    #[test]
    fn test_full_toleration() {
        let record = toleration(&[
            ("key", Value::from("gpu")),
            ("operator", Value::from("Equal")),
            ("value", Value::from("a100")),
            ("effect", Value::from("NoExecute")),
            ("toleration_seconds", Value::from(30)),
        ])
        .to_kurtosis_type()
        .unwrap();
        assert_eq!(record.effect, Some(TolerationEffect::NoExecute));
        assert_eq!(record.toleration_seconds, Some(30));
    }

    #[test]
    fn test_exists_forbids_value() {
        let err = toleration(&[
            ("operator", Value::from("Exists")),
            ("value", Value::from("a100")),
        ])
        .to_kurtosis_type()
        .unwrap_err();
        assert!(err.is_interpretation());
    }

    #[test]
    fn test_unknown_effect_rejected_at_bind() {
        let err = Toleration::create(vec![("effect".to_string(), Value::from("Sometimes"))])
            .unwrap_err();
        assert!(err.to_string().contains("effect"));
    }
}
