//! The Kurtosis type constructor framework.
//!
//! A [`KurtosisTypeConstructor`] binds script arguments against a schema and
//! wraps the result in a concrete composite type. Every composite type
//! embeds a [`KurtosisValueTypeDefault`], which provides attribute lookup,
//! copying and rendering over the bound argument set.

use std::fmt;
use std::sync::Arc;

use startosis_args::{bind, check_schema, ArgumentValuesSet, BuiltinArgument};
use startosis_core::{Copier, DefectError, Extension, FromValue, Result, StartosisError, Value};
use tracing::{debug, warn};

/// Wraps a bound argument set in a concrete composite value.
pub type Instantiate = fn(KurtosisValueTypeDefault) -> Result<Value>;

/// A script-callable constructor for one composite type.
#[derive(Debug, Clone)]
pub struct KurtosisTypeConstructor {
    name: &'static str,
    arguments: Arc<[BuiltinArgument]>,
    instantiate: Instantiate,
}

impl KurtosisTypeConstructor {
    /// Build a constructor over `arguments`. A schema that declares the same
    /// argument name twice is a defect.
    pub fn new(
        name: &'static str,
        arguments: Vec<BuiltinArgument>,
        instantiate: Instantiate,
    ) -> std::result::Result<Self, DefectError> {
        check_schema(name, &arguments)?;
        Ok(Self {
            name,
            arguments: Arc::from(arguments),
            instantiate,
        })
    }

    /// The constructor name scripts call.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arguments(&self) -> &Arc<[BuiltinArgument]> {
        &self.arguments
    }

    /// Bind a call without instantiating the concrete type.
    pub fn bind(
        &self,
        positional: Vec<Value>,
        named: Vec<(String, Value)>,
    ) -> Result<KurtosisValueTypeDefault> {
        let values = bind(self.name, &self.arguments, positional, named)?;
        for notice in values.deprecation_notices() {
            warn!(type_name = self.name, "{}", notice);
        }
        debug!(type_name = self.name, "Constructed {}", values.render_call(self.name));
        Ok(KurtosisValueTypeDefault::new(self.name, values))
    }

    /// Run the constructor as a builtin call.
    pub fn construct(&self, positional: Vec<Value>, named: Vec<(String, Value)>) -> Result<Value> {
        let base = self.bind(positional, named)?;
        (self.instantiate)(base)
    }
}

/// Shared state of every composite value: the type name and its bound
/// arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct KurtosisValueTypeDefault {
    type_name: &'static str,
    values: ArgumentValuesSet,
}

impl KurtosisValueTypeDefault {
    pub fn new(type_name: &'static str, values: ArgumentValuesSet) -> Self {
        Self { type_name, values }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn values(&self) -> &ArgumentValuesSet {
        &self.values
    }

    pub fn is_set(&self, attr: &str) -> bool {
        self.values.is_set(attr)
    }

    /// The attribute as `T` if the script supplied it.
    pub fn extract_attr_value<T: FromValue>(&self, attr: &str) -> Result<Option<T>> {
        Ok(self.values.extract_if_set(attr)?)
    }

    /// The attribute as `T`, falling back to the schema default.
    pub fn attr_value_or_default<T: FromValue>(&self, attr: &str) -> Result<T> {
        Ok(self.values.extract(attr)?)
    }

    /// An attribute the schema marks as required.
    ///
    /// The binder guarantees required attributes are present, so absence
    /// here is a defect in the type definition.
    pub fn required_attr_value<T: FromValue>(&self, attr: &str) -> Result<T> {
        self.extract_attr_value(attr)?.ok_or_else(|| {
            StartosisError::defect(format!(
                "Required attribute '{}' could not be found on type '{}'",
                attr, self.type_name
            ))
        })
    }

    pub fn attr(&self, attr: &str) -> Option<Value> {
        self.values.value(attr).cloned()
    }

    pub fn attr_names(&self) -> Vec<String> {
        self.values
            .definitions()
            .iter()
            .map(|d| d.name.to_string())
            .collect()
    }

    /// Caller-supplied attributes in declaration order.
    pub fn fields(&self) -> Vec<(String, Value)> {
        self.values
            .explicitly_set_values()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    pub fn copy_with(&self, copier: &mut Copier) -> Self {
        Self {
            type_name: self.type_name,
            values: self.values.copy_with(copier),
        }
    }

    /// Rendering with defaults made explicit.
    pub fn resolved(&self) -> String {
        self.values.render_resolved(self.type_name)
    }
}

impl fmt::Display for KurtosisValueTypeDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.values.render_call(self.type_name))
    }
}

/// A concrete composite type built on [`KurtosisValueTypeDefault`].
pub trait KurtosisValueType: Extension + FromValue + Clone {
    /// The constructor name scripts call.
    const TYPE_NAME: &'static str;

    /// The argument schema, in declaration order.
    fn arguments() -> Vec<BuiltinArgument>;

    fn from_base(base: KurtosisValueTypeDefault) -> Self;

    fn base(&self) -> &KurtosisValueTypeDefault;

    fn constructor() -> std::result::Result<KurtosisTypeConstructor, DefectError> {
        KurtosisTypeConstructor::new(Self::TYPE_NAME, Self::arguments(), instantiate::<Self>)
    }

    /// Build the type from Rust code rather than from a script call.
    fn create(named: Vec<(String, Value)>) -> Result<Self> {
        Self::constructor()?
            .bind(Vec::new(), named)
            .map(Self::from_base)
    }
}

fn instantiate<T: KurtosisValueType>(base: KurtosisValueTypeDefault) -> Result<Value> {
    Ok(Value::extension(T::from_base(base)))
}

/// Declares a composite type struct over [`KurtosisValueTypeDefault`] and
/// wires it into the value model.
macro_rules! kurtosis_value_type {
    ($(#[$meta:meta])* $name:ident, $type_name:expr, $arguments:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            base: $crate::constructor::KurtosisValueTypeDefault,
        }

        impl $crate::constructor::KurtosisValueType for $name {
            const TYPE_NAME: &'static str = $type_name;

            fn arguments() -> Vec<::startosis_args::BuiltinArgument> {
                $arguments()
            }

            fn from_base(base: $crate::constructor::KurtosisValueTypeDefault) -> Self {
                Self { base }
            }

            fn base(&self) -> &$crate::constructor::KurtosisValueTypeDefault {
                &self.base
            }
        }

        impl ::startosis_core::Extension for $name {
            fn type_name(&self) -> &str {
                $type_name
            }

            fn attr_names(&self) -> Vec<String> {
                self.base.attr_names()
            }

            fn attr(&self, name: &str) -> Option<::startosis_core::Value> {
                self.base.attr(name)
            }

            fn fields(&self) -> Vec<(String, ::startosis_core::Value)> {
                self.base.fields()
            }

            fn copy_with(
                &self,
                copier: &mut ::startosis_core::Copier,
            ) -> Option<::std::rc::Rc<dyn ::startosis_core::Extension>> {
                Some(::std::rc::Rc::new(Self {
                    base: self.base.copy_with(copier),
                }))
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl ::startosis_core::FromValue for $name {
            fn expected() -> String {
                $type_name.to_string()
            }

            fn from_value(value: &::startosis_core::Value) -> Option<Self> {
                value.downcast_ref::<$name>().cloned()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.base, f)
            }
        }
    };
}

pub(crate) use kurtosis_value_type;

#[cfg(test)]
mod tests {
    use super::*;
    use startosis_args::{validators, ArgumentKind, Deprecation};
    use startosis_core::stringify;

    fn sample_arguments() -> Vec<BuiltinArgument> {
        vec![
            BuiltinArgument::required("name", ArgumentKind::STRING)
                .with_validator(validators::non_empty_string),
            BuiltinArgument::optional("replicas", ArgumentKind::INT),
            BuiltinArgument::optional("legacy", ArgumentKind::BOOL).deprecated(Deprecation::new(
                2023,
                6,
                25,
                "Drop it",
            )),
        ]
    }

    kurtosis_value_type!(
        /// Test-only composite.
        Sample,
        "Sample",
        sample_arguments
    );

    fn named(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_construct_and_read_back() {
        let value = Sample::constructor()
            .unwrap()
            .construct(vec![Value::from("web")], vec![])
            .unwrap();
        let sample = value.downcast_ref::<Sample>().unwrap();
        assert_eq!(sample.base().required_attr_value::<String>("name").unwrap(), "web");
        assert_eq!(sample.base().extract_attr_value::<i64>("replicas").unwrap(), None);
        assert_eq!(sample.base().attr_value_or_default::<i64>("replicas").unwrap(), 0);
        assert_eq!(stringify(&value), "Sample(name=\"web\")");
        assert_eq!(sample.base().resolved(), "Sample(name=\"web\", replicas=0, legacy=False)");
    }

    #[test]
    fn test_bind_errors_are_interpretation_errors() {
        let err = Sample::constructor()
            .unwrap()
            .construct(vec![], vec![])
            .unwrap_err();
        assert!(err.is_interpretation());
        assert!(err.to_string().contains("Cannot construct 'Sample'"));
    }

    fn repeated_name_arguments() -> Vec<BuiltinArgument> {
        vec![
            BuiltinArgument::required("name", ArgumentKind::STRING),
            BuiltinArgument::required("name", ArgumentKind::STRING),
        ]
    }

    #[test]
    fn test_duplicate_argument_name_is_defect() {
        let err = KurtosisTypeConstructor::new(
            "Repeated",
            repeated_name_arguments(),
            instantiate::<Sample>,
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("Argument 'name' is declared more than once in the schema of 'Repeated'"));
    }

    #[test]
    fn test_unknown_attribute_is_defect() {
        let sample = Sample::create(named(&[("name", Value::from("web"))])).unwrap();
        let err = sample.base().extract_attr_value::<String>("image").unwrap_err();
        assert!(err.is_defect());
    }

    #[test]
    fn test_copy_detaches() {
        let sample = Sample::create(named(&[("name", Value::from("web"))])).unwrap();
        let value = Value::extension(sample);
        let mut copier = Copier::new();
        let copied = copier.copy(&value);
        assert!(copier.is_sound());
        assert!(copied == value);
        assert!(!copied.shares_storage(&value));
    }
}
