//! Schema entries for builtin arguments.

use startosis_core::{InterpretationError, Value};

use crate::deprecation::Deprecation;
use crate::kind::ArgumentKind;

/// Checks a bound value. Receives the value and the argument name.
pub type Validator = fn(&Value, &str) -> Result<(), InterpretationError>;

/// Produces the value an omitted optional argument resolves to.
pub type ZeroValueProvider = fn() -> Value;

/// One argument in a builtin's schema.
///
/// Entries hold only `'static` data and function pointers so that schemas can
/// live in the process-wide registry.
#[derive(Debug, Clone)]
pub struct BuiltinArgument {
    /// Name used for keyword binding and attribute lookup.
    pub name: &'static str,

    /// Whether the caller may omit the argument.
    pub is_optional: bool,

    /// The accepted type.
    pub kind: ArgumentKind,

    /// Overrides the kind's zero value for omitted optional arguments.
    pub default: Option<ZeroValueProvider>,

    /// Extra check run after the kind check succeeds.
    pub validator: Option<Validator>,

    /// Set when the argument is deprecated.
    pub deprecation: Option<Deprecation>,
}

impl BuiltinArgument {
    /// A required argument.
    pub const fn required(name: &'static str, kind: ArgumentKind) -> Self {
        Self {
            name,
            is_optional: false,
            kind,
            default: None,
            validator: None,
            deprecation: None,
        }
    }

    /// An optional argument.
    pub const fn optional(name: &'static str, kind: ArgumentKind) -> Self {
        Self {
            name,
            is_optional: true,
            kind,
            default: None,
            validator: None,
            deprecation: None,
        }
    }

    pub const fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub const fn with_default(mut self, default: ZeroValueProvider) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn deprecated(mut self, deprecation: Deprecation) -> Self {
        self.deprecation = Some(deprecation);
        self
    }

    /// The value this argument takes when omitted.
    pub fn zero_value(&self) -> Value {
        match self.default {
            Some(provider) => provider(),
            None => self.kind.zero_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use startosis_core::ValueKind;

    fn eighty() -> Value {
        Value::from(80)
    }

    #[test]
    fn test_builder() {
        let arg = BuiltinArgument::optional("number", ArgumentKind::INT).with_default(eighty);
        assert!(arg.is_optional);
        assert_eq!(arg.zero_value(), Value::from(80));
        assert!(arg.validator.is_none());
    }

    #[test]
    fn test_zero_value_falls_back_to_kind() {
        let arg = BuiltinArgument::optional("cmd", ArgumentKind::Of(ValueKind::List));
        assert_eq!(arg.zero_value(), Value::list(vec![]));
    }
}
