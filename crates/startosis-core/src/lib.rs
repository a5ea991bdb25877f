//! # Startosis Core
//!
//! The dynamic value model behind Kurtosis Starlark builtins.
//!
//! This crate provides:
//! - [`Value`] - Script values, with shared mutable containers
//! - [`Extension`] - Host-defined composite values
//! - [`Copier`] - Deep copies that detach plan steps from later mutation
//! - [`stringify`] - Canonical script text for any value
//! - [`parse_value`] - Reads that text back
//! - [`StartosisError`] - Interpretation errors and defects

pub mod copy;
pub mod duration;
pub mod error;
pub mod extension;
pub mod extract;
pub mod json;
pub mod script;
pub mod stringify;
pub mod types;
pub mod value;

// Re-exports for convenience
pub use copy::{deep_copy, CopyDiagnostic, Copier};
pub use duration::ScriptDuration;
pub use error::{DefectError, InterpretationError, Result, StartosisError, ValueError};
pub use extension::Extension;
pub use extract::{Comparable, FromValue};
pub use json::to_json;
pub use script::{parse_value, CallResolver, RecordResolver};
pub use stringify::{quote_string, stringify};
pub use types::ValueKind;
pub use value::{Dict, DictRef, HashKey, ListRef, Record, Set, SetRef, Value};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::copy::{deep_copy, Copier};
    pub use crate::error::{InterpretationError, Result, StartosisError};
    pub use crate::extension::Extension;
    pub use crate::extract::FromValue;
    pub use crate::stringify::stringify;
    pub use crate::value::{Dict, Record, Value};
}
