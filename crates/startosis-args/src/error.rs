//! Binding and extraction errors.

use std::fmt;

use serde::Serialize;
use startosis_core::{DefectError, InterpretationError, StartosisError};
use thiserror::Error;

/// Why one argument failed to bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ViolationReason {
    /// A required argument was not supplied.
    Missing,

    /// The supplied value has the wrong type.
    TypeMismatch { expected: String, actual: String },

    /// The validator rejected the value.
    Invalid { message: String },

    /// A keyword the schema does not declare.
    UnknownKeyword,

    /// The argument was supplied more than once.
    Duplicate,

    /// More positional values than schema entries.
    TooManyPositional { given: usize, max: usize },
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationReason::Missing => f.write_str("missing required argument"),
            ViolationReason::TypeMismatch { expected, actual } => {
                write!(f, "expected {}, got {}", expected, actual)
            }
            ViolationReason::Invalid { message } => f.write_str(message),
            ViolationReason::UnknownKeyword => f.write_str("unexpected keyword argument"),
            ViolationReason::Duplicate => f.write_str("got multiple values"),
            ViolationReason::TooManyPositional { given, max } => write!(
                f,
                "accepts at most {} positional argument(s) but {} were given",
                max, given
            ),
        }
    }
}

/// One offending argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentViolation {
    /// Argument or keyword name.
    pub argument: String,

    #[serde(flatten)]
    pub reason: ViolationReason,
}

impl ArgumentViolation {
    pub fn new(argument: impl Into<String>, reason: ViolationReason) -> Self {
        Self {
            argument: argument.into(),
            reason,
        }
    }
}

/// Every violation found while binding one call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "The following argument(s) could not be parsed or did not pass validation: {}",
    render_violations(.violations)
)]
pub struct BindError {
    /// Builtin being called.
    pub builtin: String,

    /// Violations in schema declaration order, then unknown keywords and
    /// excess positional values.
    pub violations: Vec<ArgumentViolation>,
}

impl BindError {
    /// Names of the offending arguments in order.
    pub fn arguments(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.argument.as_str()).collect()
    }
}

fn render_violations(violations: &[ArgumentViolation]) -> String {
    serde_json::to_string(violations).unwrap_or_default()
}

impl From<BindError> for InterpretationError {
    fn from(err: BindError) -> Self {
        let message = format!(
            "Cannot construct '{}' from the provided arguments.",
            err.builtin
        );
        InterpretationError::wrap(err, message)
    }
}

impl From<BindError> for StartosisError {
    fn from(err: BindError) -> Self {
        StartosisError::Interpretation(err.into())
    }
}

/// Typed lookup failure on a bound argument set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The name is not declared by the schema. Indicates a bug in the type.
    #[error("Argument '{name}' could not be found in schema")]
    NotInSchema { name: String },

    /// The stored value is not assignable to the requested type.
    #[error("Argument '{name}' is expected to be {expected} but got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}

impl From<ExtractError> for StartosisError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::NotInSchema { .. } => {
                StartosisError::Defect(DefectError::new(err.to_string()))
            }
            ExtractError::TypeMismatch { .. } => {
                StartosisError::Interpretation(InterpretationError::new(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_message() {
        let err = BindError {
            builtin: "PortSpec".to_string(),
            violations: vec![ArgumentViolation::new("number", ViolationReason::Missing)],
        };
        assert_eq!(
            err.to_string(),
            "The following argument(s) could not be parsed or did not pass validation: \
             [{\"argument\":\"number\",\"reason\":\"missing\"}]"
        );
    }

    #[test]
    fn test_bind_error_is_std_error() {
        let err = BindError {
            builtin: "PortSpec".to_string(),
            violations: vec![
                ArgumentViolation::new("number", ViolationReason::Missing),
                ArgumentViolation::new("colour", ViolationReason::UnknownKeyword),
            ],
        };
        let as_error: &dyn std::error::Error = &err;
        assert!(as_error.source().is_none());
        assert!(as_error
            .to_string()
            .ends_with("{\"argument\":\"colour\",\"reason\":\"unknown_keyword\"}]"));
    }

    #[test]
    fn test_bind_error_into_interpretation() {
        let err = BindError {
            builtin: "User".to_string(),
            violations: vec![ArgumentViolation::new("uid", ViolationReason::Missing)],
        };
        let wrapped: InterpretationError = err.into();
        assert_eq!(
            wrapped.message(),
            "Cannot construct 'User' from the provided arguments."
        );
        assert!(wrapped.cause().unwrap_or_default().contains("uid"));
    }

    #[test]
    fn test_extract_error_classes() {
        let missing: StartosisError = ExtractError::NotInSchema {
            name: "nope".to_string(),
        }
        .into();
        assert!(missing.is_defect());

        let mismatch: StartosisError = ExtractError::TypeMismatch {
            name: "uid".to_string(),
            expected: "int".to_string(),
            actual: "string".to_string(),
        }
        .into();
        assert!(mismatch.is_interpretation());
    }
}
