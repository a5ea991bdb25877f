//! Common types used across the value model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind tag of a dynamic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// The absent value.
    None,
    Bool,
    /// Arbitrary precision integer.
    Int,
    Float,
    String,
    Bytes,
    /// A UTC instant.
    Time,
    /// Signed nanosecond span.
    Duration,
    List,
    Tuple,
    Set,
    Dict,
    /// Named immutable field bag.
    Record,
    /// Host-defined composite value.
    Extension,
}

impl ValueKind {
    /// The name script authors see for this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::None => "NoneType",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Time => "time.time",
            ValueKind::Duration => "time.duration",
            ValueKind::List => "list",
            ValueKind::Tuple => "tuple",
            ValueKind::Set => "set",
            ValueKind::Dict => "dict",
            ValueKind::Record => "struct",
            ValueKind::Extension => "extension",
        }
    }

    /// Returns true for kinds whose contents can change after creation.
    pub fn is_mutable(&self) -> bool {
        matches!(self, ValueKind::List | ValueKind::Set | ValueKind::Dict)
    }

    /// Returns true for kinds that hold no other values.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ValueKind::None
                | ValueKind::Bool
                | ValueKind::Int
                | ValueKind::Float
                | ValueKind::String
                | ValueKind::Bytes
                | ValueKind::Time
                | ValueKind::Duration
        )
    }

    /// Returns true for kinds that may be used as mapping keys.
    ///
    /// Tuples additionally require every element to be hashable.
    pub fn is_hashable(&self) -> bool {
        self.is_scalar() || matches!(self, ValueKind::Tuple)
    }

    /// Returns true for kinds that support ordering comparisons.
    pub fn is_comparable(&self) -> bool {
        !matches!(
            self,
            ValueKind::None | ValueKind::Record | ValueKind::Extension
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutable_kinds() {
        assert!(ValueKind::List.is_mutable());
        assert!(ValueKind::Dict.is_mutable());
        assert!(!ValueKind::Tuple.is_mutable());
        assert!(!ValueKind::String.is_mutable());
    }

    #[test]
    fn test_hashable_kinds() {
        assert!(ValueKind::Int.is_hashable());
        assert!(ValueKind::Tuple.is_hashable());
        assert!(!ValueKind::List.is_hashable());
        assert!(!ValueKind::Extension.is_hashable());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ValueKind::Duration).unwrap();
        assert_eq!(json, "\"duration\"");
    }
}
