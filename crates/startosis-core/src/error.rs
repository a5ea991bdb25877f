//! Error types for Startosis value handling.
//!
//! Two classes of failure surface from this layer: interpretation errors,
//! caused by whoever wrote the script, and defects, which mean a type
//! definition in this codebase is wrong.

use std::fmt;

use thiserror::Error;

/// A user-facing error describing malformed, missing, mistyped or unknown
/// script input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}{}", caused_by(.cause))]
pub struct InterpretationError {
    message: String,
    cause: Option<String>,
}

impl InterpretationError {
    /// Create a new interpretation error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Create an interpretation error that wraps an underlying cause.
    pub fn wrap(cause: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// The top-level message, without the cause chain.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The rendered cause, if any.
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

fn caused_by(cause: &Option<String>) -> String {
    cause
        .as_ref()
        .map(|cause| format!("\n\tCaused by: {}", cause))
        .unwrap_or_default()
}

/// An internal inconsistency between a type definition and its own schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}. This is a Kurtosis internal bug")]
pub struct DefectError {
    /// What went wrong.
    pub message: String,
}

impl DefectError {
    /// Create a new defect error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failures raised by the dynamic value model itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A mapping key or set element was not hashable.
    #[error("unhashable type: '{type_name}'")]
    Unhashable { type_name: String },

    /// A record was built with the same field twice.
    #[error("duplicate field '{field}' on '{constructor}'")]
    DuplicateField { constructor: String, field: String },

    /// Attribute lookup on a value that lacks it.
    #[error("'{type_name}' value has no attribute '{attr}'")]
    NoSuchAttribute { type_name: String, attr: String },

    /// A container was mutated while it was being read.
    #[error("cannot access a {type_name} while it is being mutated")]
    Busy { type_name: String },

    /// A duration string could not be parsed.
    #[error("invalid duration '{0}'")]
    InvalidDuration(String),

    /// Literal text could not be read back into a value.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
}

/// Main error type for Startosis operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartosisError {
    /// The script supplied arguments the type cannot accept.
    #[error(transparent)]
    Interpretation(#[from] InterpretationError),

    /// A type definition disagrees with its own schema.
    #[error(transparent)]
    Defect(#[from] DefectError),
}

impl StartosisError {
    /// Shorthand for an interpretation error.
    pub fn interpretation(message: impl Into<String>) -> Self {
        StartosisError::Interpretation(InterpretationError::new(message))
    }

    /// Shorthand for a defect.
    pub fn defect(message: impl Into<String>) -> Self {
        StartosisError::Defect(DefectError::new(message))
    }

    /// Returns true if this error indicates a bug rather than bad input.
    pub fn is_defect(&self) -> bool {
        matches!(self, StartosisError::Defect(_))
    }

    /// Returns true if this error was caused by the script author.
    pub fn is_interpretation(&self) -> bool {
        matches!(self, StartosisError::Interpretation(_))
    }
}

/// Convenience Result type for Startosis operations.
pub type Result<T> = std::result::Result<T, StartosisError>;

impl From<ValueError> for InterpretationError {
    fn from(err: ValueError) -> Self {
        InterpretationError::new(err.to_string())
    }
}

impl From<ValueError> for StartosisError {
    fn from(err: ValueError) -> Self {
        StartosisError::Interpretation(err.into())
    }
}

impl From<serde_json::Error> for StartosisError {
    fn from(err: serde_json::Error) -> Self {
        StartosisError::defect(format!("Serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_error_renders_cause() {
        let err = InterpretationError::wrap("boom", "Outer failure");
        assert_eq!(err.to_string(), "Outer failure\n\tCaused by: boom");
        assert_eq!(err.message(), "Outer failure");
        assert_eq!(err.cause(), Some("boom"));
    }

    #[test]
    fn test_plain_error_has_no_cause_line() {
        let err = InterpretationError::new("Bad port");
        let as_error: &dyn std::error::Error = &err;
        assert_eq!(as_error.to_string(), "Bad port");
        assert!(err.cause().is_none());
    }

    #[test]
    fn test_defect_mentions_bug() {
        let err = StartosisError::defect("attribute 'x' missing from schema");
        assert!(err.is_defect());
        assert!(err.to_string().ends_with("This is a Kurtosis internal bug"));
    }

    #[test]
    fn test_value_error_is_interpretation() {
        let err: StartosisError = ValueError::Unhashable {
            type_name: "list".into(),
        }
        .into();
        assert!(err.is_interpretation());
        assert_eq!(err.to_string(), "unhashable type: 'list'");
    }
}
