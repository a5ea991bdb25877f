//! # Startosis Types
//!
//! Kurtosis composite types: script constructors, typed accessors and
//! conversion into the records the execution engine consumes.
//!
//! This crate provides:
//! - [`KurtosisTypeConstructor`] - Binds a call and wraps it in a composite value
//! - [`ServiceConfig`], [`PortSpec`], [`ReadyCondition`] and the other builtin types
//! - [`TypeRegistry`] - The sealed set of constructors scripts can call
//! - [`Plan`] - Captured calls with a stable fingerprint
//! - [`TypeDefaults`] - Conversion defaults, loadable from JSON

pub mod config;
pub mod constructor;
pub mod directory;
pub mod plan;
pub mod port_spec;
pub mod recipe;
pub mod records;
pub mod registry;
pub mod resolver;
pub mod service_config;

// Re-exports for convenience
pub use config::{ConversionContext, TypeDefaults};
pub use constructor::{
    Instantiate, KurtosisTypeConstructor, KurtosisValueType, KurtosisValueTypeDefault,
};
pub use directory::{Directory, DirectoryContent};
pub use plan::{Plan, PlannedCall};
pub use port_spec::PortSpec;
pub use recipe::{ExecRecipe, GetHttpRequestRecipe, PostHttpRequestRecipe, Recipe};
pub use records::*;
pub use registry::{builtin_types, global, TypeRegistry, TypeRegistryBuilder};
pub use resolver::{
    LocalPackageContentProvider, PackageAbsoluteLocator, PackageContentProvider,
    STANDALONE_PACKAGE_ID,
};
pub use service_config::{
    ImageBuildSpec, ImageSpec, IngressHttpRule, IngressSpec, IngressTlsConfig, NixBuildSpec,
    ReadyCondition, ServiceConfig, Toleration, User,
};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{ConversionContext, TypeDefaults};
    pub use crate::constructor::{KurtosisTypeConstructor, KurtosisValueType};
    pub use crate::plan::{Plan, PlannedCall};
    pub use crate::registry::{global, TypeRegistry};
    pub use crate::resolver::PackageContentProvider;
    pub use crate::service_config::ServiceConfig;
}
