//! # Startosis Args
//!
//! Argument schemas and binding for Kurtosis Starlark builtins.
//!
//! This crate provides:
//! - [`BuiltinArgument`] - One schema entry with kind, default, validator
//! - [`bind`] - Binds positional and keyword arguments onto a schema
//! - [`ArgumentValuesSet`] - Bound values with typed extraction
//! - [`validators`] - Reusable argument checks
//! - [`BindError`] - Every violation found in one call

pub mod argument;
pub mod binder;
pub mod cast;
pub mod deprecation;
pub mod error;
pub mod kind;
pub mod validators;
pub mod values_set;

// Re-exports for convenience
pub use argument::{BuiltinArgument, Validator, ZeroValueProvider};
pub use binder::{bind, check_schema};
pub use cast::{safe_cast_to_string, safe_cast_to_string_list, safe_cast_to_string_map};
pub use deprecation::{Deprecation, DeprecationDate, DeprecationNotice};
pub use error::{ArgumentViolation, BindError, ExtractError, ViolationReason};
pub use kind::ArgumentKind;
pub use values_set::ArgumentValuesSet;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::argument::BuiltinArgument;
    pub use crate::binder::bind;
    pub use crate::error::{BindError, ExtractError};
    pub use crate::kind::ArgumentKind;
    pub use crate::values_set::ArgumentValuesSet;
}
