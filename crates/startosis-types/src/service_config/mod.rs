//! `ServiceConfig` and the composite types only a service config uses.

mod image_build_spec;
mod image_spec;
mod ingress;
mod nix_build_spec;
mod ready_condition;
mod toleration;
mod user;

pub use image_build_spec::{ImageBuildSpec, IMAGE_BUILD_SPEC_TYPE_NAME};
pub use image_spec::{ImageSpec, IMAGE_SPEC_TYPE_NAME};
pub use ingress::{
    IngressHttpRule, IngressSpec, IngressTlsConfig, INGRESS_HTTP_RULE_TYPE_NAME,
    INGRESS_SPEC_TYPE_NAME, INGRESS_TLS_CONFIG_TYPE_NAME,
};
pub use nix_build_spec::{NixBuildSpec, NIX_BUILD_SPEC_TYPE_NAME};
pub use ready_condition::{
    ReadyCondition, DEFAULT_INTERVAL, DEFAULT_TIMEOUT, READY_CONDITION_TYPE_NAME,
};
pub use toleration::{Toleration, TOLERATION_TYPE_NAME};
pub use user::{User, USER_TYPE_NAME};

use std::collections::BTreeMap;

use startosis_args::{
    safe_cast_to_string, safe_cast_to_string_list, safe_cast_to_string_map, validators,
    ArgumentKind, BuiltinArgument, Deprecation,
};
use startosis_core::{InterpretationError, Result, StartosisError, Value};

use crate::config::{ConversionContext, TypeDefaults};
use crate::constructor::kurtosis_value_type;
use crate::directory::{Directory, DirectoryContent};
use crate::port_spec::PortSpec;
use crate::records::{
    ImageSource, IngressRecord, PersistentDirectoryRecord, PortSpecRecord, ServiceConfigRecord,
    TolerationRecord,
};

pub const SERVICE_CONFIG_TYPE_NAME: &str = "ServiceConfig";

pub const IMAGE_ATTR: &str = "image";
pub const PORTS_ATTR: &str = "ports";
pub const PUBLIC_PORTS_ATTR: &str = "public_ports";
pub const FILES_ATTR: &str = "files";
pub const ENTRYPOINT_ATTR: &str = "entrypoint";
pub const CMD_ATTR: &str = "cmd";
pub const ENV_VARS_ATTR: &str = "env_vars";
pub const PRIVATE_IP_ADDRESS_PLACEHOLDER_ATTR: &str = "private_ip_address_placeholder";
pub const CPU_ALLOCATION_ATTR: &str = "cpu_allocation";
pub const MEMORY_ALLOCATION_ATTR: &str = "memory_allocation";
pub const MAX_CPU_ATTR: &str = "max_cpu";
pub const MIN_CPU_ATTR: &str = "min_cpu";
pub const MAX_MEMORY_ATTR: &str = "max_memory";
pub const MIN_MEMORY_ATTR: &str = "min_memory";
pub const READY_CONDITIONS_ATTR: &str = "ready_conditions";
pub const LABELS_ATTR: &str = "labels";
pub const USER_ATTR: &str = "user";
pub const TOLERATIONS_ATTR: &str = "tolerations";
pub const NODE_SELECTORS_ATTR: &str = "node_selectors";
pub const FILES_TO_BE_MOVED_ATTR: &str = "files_to_be_moved";
pub const TINI_ENABLED_ATTR: &str = "tini_enabled";
pub const INGRESS_ATTR: &str = "ingress";

const MIN_MEMORY_ALLOCATION_MB: u64 = 6;

const CPU_ALLOCATION_DEPRECATION: Deprecation = Deprecation::new(
    2023,
    6,
    25,
    "This field is being deprecated in favour of `max_cpu` to set a maximum cpu a container can use",
);
const MEMORY_ALLOCATION_DEPRECATION: Deprecation = Deprecation::new(
    2023,
    6,
    25,
    "This field is being deprecated in favour of `max_memory` to set maximum memory a container can use",
);

fn validate_image(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    if value.downcast_ref::<ImageBuildSpec>().is_some()
        || value.downcast_ref::<ImageSpec>().is_some()
        || value.downcast_ref::<NixBuildSpec>().is_some()
    {
        return Ok(());
    }
    if value.as_str().is_some() {
        return validators::non_empty_string(value, name);
    }
    Err(InterpretationError::new(format!(
        "The '{}' attribute must be a string, {}, {} or {} (was '{}')",
        name,
        IMAGE_BUILD_SPEC_TYPE_NAME,
        IMAGE_SPEC_TYPE_NAME,
        NIX_BUILD_SPEC_TYPE_NAME,
        value.type_name()
    )))
}

fn validate_millicores(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    validators::uint64_in_range(value, name, 0, u64::MAX)
}

fn validate_memory(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    validators::uint64_in_range(value, name, MIN_MEMORY_ALLOCATION_MB, u64::MAX)
}

fn service_config_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::required(IMAGE_ATTR, ArgumentKind::Any).with_validator(validate_image),
        BuiltinArgument::optional(PORTS_ATTR, ArgumentKind::DICT),
        BuiltinArgument::optional(PUBLIC_PORTS_ATTR, ArgumentKind::DICT),
        BuiltinArgument::optional(FILES_ATTR, ArgumentKind::DICT),
        BuiltinArgument::optional(ENTRYPOINT_ATTR, ArgumentKind::LIST),
        BuiltinArgument::optional(CMD_ATTR, ArgumentKind::LIST),
        BuiltinArgument::optional(ENV_VARS_ATTR, ArgumentKind::DICT),
        BuiltinArgument::optional(PRIVATE_IP_ADDRESS_PLACEHOLDER_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::optional(CPU_ALLOCATION_ATTR, ArgumentKind::INT)
            .with_validator(validate_millicores)
            .deprecated(CPU_ALLOCATION_DEPRECATION),
        BuiltinArgument::optional(MEMORY_ALLOCATION_ATTR, ArgumentKind::INT)
            .with_validator(validate_memory)
            .deprecated(MEMORY_ALLOCATION_DEPRECATION),
        BuiltinArgument::optional(MAX_CPU_ATTR, ArgumentKind::INT)
            .with_validator(validate_millicores),
        BuiltinArgument::optional(MIN_CPU_ATTR, ArgumentKind::INT),
        BuiltinArgument::optional(MAX_MEMORY_ATTR, ArgumentKind::INT)
            .with_validator(validate_memory),
        BuiltinArgument::optional(MIN_MEMORY_ATTR, ArgumentKind::INT),
        BuiltinArgument::optional(
            READY_CONDITIONS_ATTR,
            ArgumentKind::Composite(READY_CONDITION_TYPE_NAME),
        ),
        BuiltinArgument::optional(LABELS_ATTR, ArgumentKind::DICT)
            .with_validator(validators::service_labels),
        BuiltinArgument::optional(USER_ATTR, ArgumentKind::Composite(USER_TYPE_NAME)),
        BuiltinArgument::optional(TOLERATIONS_ATTR, ArgumentKind::LIST),
        BuiltinArgument::optional(NODE_SELECTORS_ATTR, ArgumentKind::DICT)
            .with_validator(validators::string_mapping_to_string),
        BuiltinArgument::optional(FILES_TO_BE_MOVED_ATTR, ArgumentKind::DICT)
            .with_validator(validators::string_mapping_to_string),
        BuiltinArgument::optional(TINI_ENABLED_ATTR, ArgumentKind::BOOL),
        BuiltinArgument::optional(INGRESS_ATTR, ArgumentKind::Composite(INGRESS_SPEC_TYPE_NAME)),
    ]
}

kurtosis_value_type!(
    /// Everything needed to start one service.
    ServiceConfig,
    SERVICE_CONFIG_TYPE_NAME,
    service_config_arguments
);

impl ServiceConfig {
    /// The readiness check, if one was given.
    pub fn ready_condition(&self) -> Result<Option<ReadyCondition>> {
        self.base.extract_attr_value(READY_CONDITIONS_ATTR)
    }

    /// The image name and where the image comes from.
    pub fn image(&self, ctx: &ConversionContext<'_>) -> Result<(String, ImageSource)> {
        let image: Value = self.base.required_attr_value(IMAGE_ATTR)?;
        if let Some(spec) = image.downcast_ref::<ImageBuildSpec>() {
            let record = spec.to_kurtosis_type(ctx)?;
            return Ok((record.image_name.clone(), ImageSource::Build(record)));
        }
        if let Some(spec) = image.downcast_ref::<ImageSpec>() {
            let record = spec.to_kurtosis_type()?;
            return Ok((record.image.clone(), ImageSource::Registry(record)));
        }
        if let Some(spec) = image.downcast_ref::<NixBuildSpec>() {
            let record = spec.to_kurtosis_type(ctx)?;
            return Ok((record.image_name.clone(), ImageSource::Nix(record)));
        }
        Ok((safe_cast_to_string(&image, IMAGE_ATTR)?, ImageSource::Pull))
    }

    fn ports(&self, attr: &str) -> Result<BTreeMap<String, PortSpecRecord>> {
        let mut ports = BTreeMap::new();
        let Some(dict) = self.set_dict(attr)? else {
            return Ok(ports);
        };
        let dict = dict.borrow();
        for (key, value) in dict.iter() {
            let key = key.as_str().ok_or_else(|| {
                StartosisError::interpretation(format!(
                    "Unable to convert key of '{}' dictionary '{}' to string",
                    attr,
                    startosis_core::stringify(key)
                ))
            })?;
            let port = value.downcast_ref::<PortSpec>().ok_or_else(|| {
                StartosisError::interpretation(format!(
                    "Unable to convert value of '{}' dictionary entry '{}' to a port object",
                    attr, key
                ))
            })?;
            ports.insert(key.to_string(), port.to_kurtosis_type()?);
        }
        Ok(ports)
    }

    /// Files artifacts and persistent directories keyed by mount path.
    #[allow(clippy::type_complexity)]
    pub fn files(
        &self,
        defaults: &TypeDefaults,
    ) -> Result<(
        BTreeMap<String, Vec<String>>,
        BTreeMap<String, PersistentDirectoryRecord>,
    )> {
        let mut artifacts = BTreeMap::new();
        let mut persistent = BTreeMap::new();
        let Some(dict) = self.set_dict(FILES_ATTR)? else {
            return Ok((artifacts, persistent));
        };
        let dict = dict.borrow();
        for (key, value) in dict.iter() {
            let path = key.as_str().ok_or_else(|| {
                StartosisError::interpretation(format!(
                    "Unable to convert key of '{}' dictionary '{}' to string",
                    FILES_ATTR,
                    startosis_core::stringify(key)
                ))
            })?;
            let directory = match (value.downcast_ref::<Directory>(), value.as_str()) {
                (Some(directory), _) => directory.clone(),
                (None, Some(artifact_name)) => Directory::from_files_artifact(artifact_name)?,
                (None, None) => {
                    return Err(StartosisError::interpretation(format!(
                        "Unable to convert value of '{}' dictionary entry '{}' to a Directory object",
                        FILES_ATTR, path
                    )))
                }
            };
            match directory.content(defaults)? {
                DirectoryContent::FilesArtifacts(names) => {
                    artifacts.insert(path.to_string(), names);
                }
                DirectoryContent::Persistent {
                    persistent_key,
                    size_mb,
                } => {
                    persistent.insert(
                        path.to_string(),
                        PersistentDirectoryRecord {
                            persistent_key,
                            size_mb,
                        },
                    );
                }
            }
        }
        Ok((artifacts, persistent))
    }

    fn tolerations(&self) -> Result<Vec<TolerationRecord>> {
        let Some(value) = self.set_attr(TOLERATIONS_ATTR) else {
            return Ok(Vec::new());
        };
        let Some(list) = value.as_list() else {
            return Ok(Vec::new());
        };
        let items = list.borrow();
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let toleration = item.downcast_ref::<Toleration>().ok_or_else(|| {
                    StartosisError::interpretation(format!(
                        "Expected item at index '{}' of the tolerations list passed via '{}' attr to be a '{}' but it wasn't",
                        index, TOLERATIONS_ATTR, TOLERATION_TYPE_NAME
                    ))
                })?;
                toleration.to_kurtosis_type().map_err(|err| {
                    StartosisError::Interpretation(InterpretationError::wrap(
                        err,
                        format!(
                            "Error occurred while converting object at '{}' of '{}' list to internal type",
                            index, TOLERATIONS_ATTR
                        ),
                    ))
                })
            })
            .collect()
    }

    /// The ingress, with every rule checked against the private ports.
    fn ingress(
        &self,
        private_ports: &BTreeMap<String, PortSpecRecord>,
    ) -> Result<Option<IngressRecord>> {
        let Some(spec) = self.base.extract_attr_value::<IngressSpec>(INGRESS_ATTR)? else {
            return Ok(None);
        };
        let record = spec.to_kurtosis_type()?;
        if let Some(rule) = record
            .rules
            .iter()
            .find(|rule| !private_ports.contains_key(&rule.port_id))
        {
            return Err(StartosisError::interpretation(format!(
                "Ingress rule for path '{}' targets port '{}' which is not declared in '{}'",
                rule.path, rule.port_id, PORTS_ATTR
            )));
        }
        Ok(Some(record))
    }

    fn set_attr(&self, attr: &str) -> Option<Value> {
        if self.base.is_set(attr) {
            self.base.attr(attr)
        } else {
            None
        }
    }

    fn set_dict(&self, attr: &str) -> Result<Option<startosis_core::DictRef>> {
        self.base.extract_attr_value(attr)
    }

    fn string_list(&self, attr: &str) -> Result<Vec<String>> {
        match self.set_attr(attr) {
            Some(value) => Ok(safe_cast_to_string_list(&value, attr)?),
            None => Ok(Vec::new()),
        }
    }

    fn string_map(&self, attr: &str) -> Result<BTreeMap<String, String>> {
        match self.set_attr(attr) {
            Some(value) => Ok(safe_cast_to_string_map(&value, attr)?),
            None => Ok(BTreeMap::new()),
        }
    }

    fn u64_attr(&self, attr: &str) -> Result<Option<u64>> {
        self.base.extract_attr_value(attr)
    }

    /// Convert into the record the engine starts services from.
    pub fn to_kurtosis_type(&self, ctx: &ConversionContext<'_>) -> Result<ServiceConfigRecord> {
        let defaults = &ctx.defaults;
        let (image_name, image_source) = self.image(ctx)?;
        let (files_artifacts, persistent_directories) = self.files(defaults)?;

        let private_ip_address_placeholder = self
            .base
            .extract_attr_value::<String>(PRIVATE_IP_ADDRESS_PLACEHOLDER_ATTR)?
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| defaults.private_ip_address_placeholder.clone());

        let max_cpu_millicores = match self.u64_attr(MAX_CPU_ATTR)? {
            Some(cpu) => cpu,
            None => self.u64_attr(CPU_ALLOCATION_ATTR)?.unwrap_or(0),
        };
        let max_memory_mb = match self.u64_attr(MAX_MEMORY_ATTR)? {
            Some(memory) => memory,
            None => self.u64_attr(MEMORY_ALLOCATION_ATTR)?.unwrap_or(0),
        };
        if max_memory_mb != 0 && max_memory_mb < defaults.min_memory_allocation_mb {
            return Err(StartosisError::interpretation(format!(
                "Memory allocation of {} MB is below the minimum of {} MB",
                max_memory_mb, defaults.min_memory_allocation_mb
            )));
        }

        let user = match self.base.extract_attr_value::<User>(USER_ATTR)? {
            Some(user) => Some(user.to_kurtosis_type()?),
            None => None,
        };

        let private_ports = self.ports(PORTS_ATTR)?;
        let ingress = self.ingress(&private_ports)?;

        Ok(ServiceConfigRecord {
            image_name,
            image_source,
            private_ports,
            public_ports: self.ports(PUBLIC_PORTS_ATTR)?,
            files_artifacts,
            persistent_directories,
            entrypoint: self.string_list(ENTRYPOINT_ATTR)?,
            cmd: self.string_list(CMD_ATTR)?,
            env_vars: self.string_map(ENV_VARS_ATTR)?,
            private_ip_address_placeholder,
            max_cpu_millicores,
            min_cpu_millicores: self.u64_attr(MIN_CPU_ATTR)?.unwrap_or(0),
            max_memory_mb,
            min_memory_mb: self.u64_attr(MIN_MEMORY_ATTR)?.unwrap_or(0),
            labels: self.string_map(LABELS_ATTR)?,
            user,
            tolerations: self.tolerations()?,
            node_selectors: self.string_map(NODE_SELECTORS_ATTR)?,
            files_to_be_moved: self.string_map(FILES_TO_BE_MOVED_ATTR)?,
            image_download_mode: ctx.image_download_mode,
            tini_enabled: self
                .base
                .extract_attr_value::<bool>(TINI_ENABLED_ATTR)?
                .unwrap_or(defaults.tini_enabled),
            ingress,
        })
    }
}
