//! `ReadyCondition(recipe, field, assertion, target_value, interval?, timeout?)`.

use startosis_args::{validators, ArgumentKind, BuiltinArgument};
use startosis_core::{to_json, InterpretationError, Result, ScriptDuration, StartosisError, Value};

use crate::config::TypeDefaults;
use crate::constructor::kurtosis_value_type;
use crate::recipe::{validate_recipe, Recipe};
use crate::records::{Assertion, ReadyConditionRecord};

pub const READY_CONDITION_TYPE_NAME: &str = "ReadyCondition";

pub const RECIPE_ATTR: &str = "recipe";
pub const FIELD_ATTR: &str = "field";
pub const ASSERTION_ATTR: &str = "assertion";
pub const TARGET_VALUE_ATTR: &str = "target_value";
pub const INTERVAL_ATTR: &str = "interval";
pub const TIMEOUT_ATTR: &str = "timeout";

pub const DEFAULT_INTERVAL: ScriptDuration = ScriptDuration::from_secs(1);
pub const DEFAULT_TIMEOUT: ScriptDuration = ScriptDuration::from_mins(15);

fn ready_condition_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::required(RECIPE_ATTR, ArgumentKind::Any).with_validator(validate_recipe),
        BuiltinArgument::required(FIELD_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::required(ASSERTION_ATTR, ArgumentKind::STRING)
            .with_validator(validators::assertion_token),
        BuiltinArgument::required(TARGET_VALUE_ATTR, ArgumentKind::Comparable),
        BuiltinArgument::optional(INTERVAL_ATTR, ArgumentKind::STRING)
            .with_validator(validators::duration),
        BuiltinArgument::optional(TIMEOUT_ATTR, ArgumentKind::STRING)
            .with_validator(validators::duration),
    ]
}

kurtosis_value_type!(
    /// When a service counts as ready: a recipe result field checked
    /// against a target value.
    ReadyCondition,
    READY_CONDITION_TYPE_NAME,
    ready_condition_arguments
);

impl ReadyCondition {
    pub fn recipe(&self) -> Result<Recipe> {
        let value: Value = self.base.required_attr_value(RECIPE_ATTR)?;
        Recipe::from_value(&value).ok_or_else(|| {
            StartosisError::interpretation(format!(
                "The '{}' attribute is not a Recipe (was '{}').",
                RECIPE_ATTR,
                value.type_name()
            ))
        })
    }

    pub fn field(&self) -> Result<String> {
        self.base.required_attr_value(FIELD_ATTR)
    }

    pub fn assertion(&self) -> Result<Assertion> {
        let token: String = self.base.required_attr_value(ASSERTION_ATTR)?;
        Assertion::parse(&token).ok_or_else(|| {
            StartosisError::interpretation(format!("Invalid assertion token '{}'", token))
        })
    }

    pub fn target_value(&self) -> Result<Value> {
        self.base.required_attr_value(TARGET_VALUE_ATTR)
    }

    /// Interval between checks; unset or empty means [`DEFAULT_INTERVAL`].
    pub fn interval(&self) -> Result<ScriptDuration> {
        self.duration_or(INTERVAL_ATTR, DEFAULT_INTERVAL)
    }

    /// Overall timeout; unset or empty means [`DEFAULT_TIMEOUT`].
    pub fn timeout(&self) -> Result<ScriptDuration> {
        self.duration_or(TIMEOUT_ATTR, DEFAULT_TIMEOUT)
    }

    fn duration_or(&self, attr: &str, default: ScriptDuration) -> Result<ScriptDuration> {
        let text: Option<String> = self.base.extract_attr_value(attr)?;
        match text.as_deref() {
            None | Some("") => Ok(default),
            Some(text) => ScriptDuration::parse(text).map_err(|err| {
                StartosisError::Interpretation(InterpretationError::wrap(
                    err,
                    format!("An error occurred when parsing {} '{}'", attr, text),
                ))
            }),
        }
    }

    /// Convert, taking unset durations from `defaults`.
    pub fn to_kurtosis_type(&self, defaults: &TypeDefaults) -> Result<ReadyConditionRecord> {
        let interval = if self.base.is_set(INTERVAL_ATTR) {
            self.interval()?
        } else {
            defaults.ready_interval
        };
        let timeout = if self.base.is_set(TIMEOUT_ATTR) {
            self.timeout()?
        } else {
            defaults.ready_timeout
        };
        Ok(ReadyConditionRecord {
            recipe: self.recipe()?.to_kurtosis_type(defaults)?,
            field: self.field()?,
            assertion: self.assertion()?,
            target_value: to_json(&self.target_value()?),
            interval,
            timeout,
        })
    }
}
