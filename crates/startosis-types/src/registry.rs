//! The sealed registry of composite type constructors.
//!
//! Types are registered once through a [`TypeRegistryBuilder`]; sealing it
//! yields an immutable [`TypeRegistry`] that is shared across threads. The
//! process-wide registry of builtin types is built lazily on first use.

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use startosis_args::validators::check_builtin_patterns;
use startosis_core::{
    CallResolver, DefectError, RecordResolver, Result, StartosisError, Value,
};
use tracing::debug;

use crate::constructor::{KurtosisTypeConstructor, KurtosisValueType};
use crate::directory::Directory;
use crate::port_spec::PortSpec;
use crate::recipe::{ExecRecipe, GetHttpRequestRecipe, PostHttpRequestRecipe};
use crate::service_config::{
    ImageBuildSpec, ImageSpec, IngressHttpRule, IngressSpec, IngressTlsConfig, NixBuildSpec,
    ReadyCondition, ServiceConfig, Toleration, User,
};

/// Collects constructors before the registry is sealed.
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    constructors: IndexMap<&'static str, KurtosisTypeConstructor>,
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor. A second constructor with the same name is a
    /// defect.
    pub fn register(mut self, constructor: KurtosisTypeConstructor) -> std::result::Result<Self, DefectError> {
        let name = constructor.name();
        if self.constructors.contains_key(name) {
            return Err(DefectError::new(format!(
                "Type '{}' is registered more than once",
                name
            )));
        }
        self.constructors.insert(name, constructor);
        Ok(self)
    }

    pub fn register_type<T: KurtosisValueType>(self) -> std::result::Result<Self, DefectError> {
        self.register(T::constructor()?)
    }

    pub fn seal(self) -> TypeRegistry {
        debug!(types = self.constructors.len(), "Sealed type registry");
        TypeRegistry {
            constructors: Arc::new(self.constructors),
        }
    }
}

/// An immutable set of constructors, looked up by type name.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    constructors: Arc<IndexMap<&'static str, KurtosisTypeConstructor>>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&KurtosisTypeConstructor> {
        self.constructors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Type names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Call the constructor registered under `name`.
    pub fn construct(
        &self,
        name: &str,
        positional: Vec<Value>,
        named: Vec<(String, Value)>,
    ) -> Result<Value> {
        let constructor = self.get(name).ok_or_else(|| {
            StartosisError::interpretation(format!("'{}' is not a known type", name))
        })?;
        constructor.construct(positional, named)
    }
}

/// Registered types construct themselves; any other call becomes a record.
impl CallResolver for TypeRegistry {
    fn resolve_call(
        &self,
        name: &str,
        positional: Vec<Value>,
        named: Vec<(String, Value)>,
    ) -> Result<Value> {
        match self.get(name) {
            Some(constructor) => constructor.construct(positional, named),
            None => RecordResolver.resolve_call(name, positional, named),
        }
    }
}

/// A registry holding every builtin composite type.
///
/// Fails if a builtin schema repeats an argument name or a builtin
/// validator pattern does not compile.
pub fn builtin_types() -> std::result::Result<TypeRegistry, DefectError> {
    check_builtin_patterns()?;
    Ok(TypeRegistry::builder()
        .register_type::<PortSpec>()?
        .register_type::<Directory>()?
        .register_type::<User>()?
        .register_type::<Toleration>()?
        .register_type::<ImageBuildSpec>()?
        .register_type::<ImageSpec>()?
        .register_type::<NixBuildSpec>()?
        .register_type::<GetHttpRequestRecipe>()?
        .register_type::<PostHttpRequestRecipe>()?
        .register_type::<ExecRecipe>()?
        .register_type::<ReadyCondition>()?
        .register_type::<IngressTlsConfig>()?
        .register_type::<IngressHttpRule>()?
        .register_type::<IngressSpec>()?
        .register_type::<ServiceConfig>()?
        .seal())
}

static GLOBAL: Lazy<std::result::Result<TypeRegistry, DefectError>> = Lazy::new(builtin_types);

/// The process-wide builtin registry.
pub fn global() -> Result<&'static TypeRegistry> {
    GLOBAL.as_ref().map_err(|err| StartosisError::Defect(err.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use startosis_core::{parse_value, stringify};

    #[test]
    fn test_builtin_names() {
        let registry = global().unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names.len(), 15);
        assert_eq!(names[0], "PortSpec");
        assert!(registry.contains("ServiceConfig"));
        assert!(registry.contains("IngressSpec"));
    }

    #[test]
    fn test_duplicate_registration_is_defect() {
        let err = TypeRegistry::builder()
            .register_type::<PortSpec>()
            .unwrap()
            .register_type::<PortSpec>()
            .unwrap_err();
        assert!(err.to_string().contains("'PortSpec' is registered more than once"));
    }

    #[test]
    fn test_ingress_reads_back_through_registry() {
        let registry = global().unwrap();
        let text = r#"IngressSpec(host="api.example.com", tls=IngressTlsConfig(secret_name="api-cert"), http_rules=[IngressHttpRule(path="/", port_id="http")])"#;
        let value = parse_value(text, registry).unwrap();
        assert!(value.downcast_ref::<IngressSpec>().is_some());
        assert_eq!(stringify(&value), text);
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypeRegistry>();
    }

    #[test]
    fn test_resolver_falls_back_to_records() {
        let registry = global().unwrap();
        let value = parse_value(r#"struct(port=PortSpec(number=80))"#, registry).unwrap();
        assert_eq!(stringify(&value), "struct(port=PortSpec(number=80))");
        let port = value.attr("port").unwrap();
        assert!(port.downcast_ref::<PortSpec>().is_some());
    }

    #[test]
    fn test_unknown_type() {
        let err = global()
            .unwrap()
            .construct("Pod", vec![], vec![])
            .unwrap_err();
        assert!(err.to_string().contains("'Pod' is not a known type"));
    }
}
