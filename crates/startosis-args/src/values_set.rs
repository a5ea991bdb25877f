//! Bound argument values and typed extraction.

use std::sync::Arc;

use startosis_core::{stringify, Copier, DefectError, FromValue, Value};

use crate::argument::BuiltinArgument;
use crate::deprecation::DeprecationNotice;
use crate::error::ExtractError;

/// A schema paired with one invocation's bound values.
///
/// `values` always has one entry per schema entry. Omitted optional
/// arguments hold their zero value and are tracked in `explicitly_set`.
#[derive(Debug, Clone)]
pub struct ArgumentValuesSet {
    definitions: Arc<[BuiltinArgument]>,
    values: Vec<Value>,
    explicitly_set: Vec<bool>,
}

impl ArgumentValuesSet {
    /// Build a set from already-checked values, one slot per schema entry.
    ///
    /// `None` slots take the argument's zero value. A length mismatch or an
    /// empty required slot is a defect.
    pub fn new(
        definitions: Arc<[BuiltinArgument]>,
        values: Vec<Option<Value>>,
    ) -> Result<Self, DefectError> {
        if definitions.len() != values.len() {
            return Err(DefectError::new(format!(
                "Schema declares {} argument(s) but {} value(s) were provided",
                definitions.len(),
                values.len()
            )));
        }
        let mut bound = Vec::with_capacity(values.len());
        let mut explicitly_set = Vec::with_capacity(values.len());
        for (definition, value) in definitions.iter().zip(values) {
            match value {
                Some(value) => {
                    bound.push(value);
                    explicitly_set.push(true);
                }
                None if definition.is_optional => {
                    bound.push(definition.zero_value());
                    explicitly_set.push(false);
                }
                None => {
                    return Err(DefectError::new(format!(
                        "Required argument '{}' has no value",
                        definition.name
                    )))
                }
            }
        }
        Ok(Self {
            definitions,
            values: bound,
            explicitly_set,
        })
    }

    pub fn definitions(&self) -> &Arc<[BuiltinArgument]> {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.definitions.iter().position(|d| d.name == name)
    }

    /// True when the argument holds a caller-supplied value.
    ///
    /// Required arguments are always set. Unknown names are never set.
    pub fn is_set(&self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => !self.definitions[idx].is_optional || self.explicitly_set[idx],
            None => false,
        }
    }

    /// The bound value, default included.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.position(name).map(|idx| &self.values[idx])
    }

    /// Extract an argument as `T`.
    pub fn extract<T: FromValue>(&self, name: &str) -> Result<T, ExtractError> {
        let value = self.value(name).ok_or_else(|| ExtractError::NotInSchema {
            name: name.to_string(),
        })?;
        T::from_value(value).ok_or_else(|| ExtractError::TypeMismatch {
            name: name.to_string(),
            expected: T::expected(),
            actual: value.type_name().to_string(),
        })
    }

    /// Extract an argument only if the caller supplied it.
    pub fn extract_if_set<T: FromValue>(&self, name: &str) -> Result<Option<T>, ExtractError> {
        if self.position(name).is_none() {
            return Err(ExtractError::NotInSchema {
                name: name.to_string(),
            });
        }
        if !self.is_set(name) {
            return Ok(None);
        }
        self.extract(name).map(Some)
    }

    /// All arguments in declaration order, defaults included.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.definitions
            .iter()
            .zip(self.values.iter())
            .map(|(d, v)| (d.name, v))
    }

    /// Only the caller-supplied arguments, in declaration order.
    pub fn explicitly_set_values(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.iter()
            .zip(self.explicitly_set.iter())
            .filter(|(_, set)| **set)
            .map(|(pair, _)| pair)
    }

    /// Deep copy through an existing copier.
    pub fn copy_with(&self, copier: &mut Copier) -> Self {
        Self {
            definitions: self.definitions.clone(),
            values: self.values.iter().map(|v| copier.copy(v)).collect(),
            explicitly_set: self.explicitly_set.clone(),
        }
    }

    pub fn deep_copy(&self) -> Self {
        self.copy_with(&mut Copier::new())
    }

    /// Deprecated arguments the caller supplied.
    pub fn deprecation_notices(&self) -> Vec<DeprecationNotice> {
        self.definitions
            .iter()
            .zip(self.explicitly_set.iter())
            .filter(|(_, set)| **set)
            .filter_map(|(definition, _)| {
                definition.deprecation.map(|deprecation| DeprecationNotice {
                    argument: definition.name.to_string(),
                    deprecation,
                })
            })
            .collect()
    }

    /// `name(arg=value, ...)` over the caller-supplied arguments.
    pub fn render_call(&self, name: &str) -> String {
        render(name, self.explicitly_set_values())
    }

    /// `name(arg=value, ...)` over every argument, defaults included.
    pub fn render_resolved(&self, name: &str) -> String {
        render(name, self.iter())
    }
}

fn render<'a>(name: &str, args: impl Iterator<Item = (&'static str, &'a Value)>) -> String {
    let parts: Vec<String> = args
        .map(|(arg, value)| format!("{}={}", arg, stringify(value)))
        .collect();
    format!("{}({})", name, parts.join(", "))
}

impl PartialEq for ArgumentValuesSet {
    fn eq(&self, other: &Self) -> bool {
        self.definitions.len() == other.definitions.len()
            && self
                .definitions
                .iter()
                .zip(other.definitions.iter())
                .all(|(a, b)| a.name == b.name)
            && self.values == other.values
            && self.explicitly_set == other.explicitly_set
    }
}
