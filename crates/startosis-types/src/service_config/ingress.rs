//! Kubernetes ingress types: `IngressSpec`, `IngressTlsConfig` and
//! `IngressHttpRule`.

use std::collections::BTreeMap;

use startosis_args::{
    safe_cast_to_string_list, safe_cast_to_string_map, validators, ArgumentKind, BuiltinArgument,
};
use startosis_core::{InterpretationError, Result, StartosisError, Value};

use crate::constructor::kurtosis_value_type;
use crate::records::{IngressPathType, IngressRecord, IngressRuleRecord, IngressTlsRecord};

pub const INGRESS_SPEC_TYPE_NAME: &str = "IngressSpec";
pub const INGRESS_TLS_CONFIG_TYPE_NAME: &str = "IngressTlsConfig";
pub const INGRESS_HTTP_RULE_TYPE_NAME: &str = "IngressHttpRule";

pub const HOST_ATTR: &str = "host";
pub const INGRESS_CLASS_NAME_ATTR: &str = "ingress_class_name";
pub const ANNOTATIONS_ATTR: &str = "annotations";
pub const TLS_ATTR: &str = "tls";
pub const HTTP_RULES_ATTR: &str = "http_rules";

pub const SECRET_NAME_ATTR: &str = "secret_name";
pub const HOSTS_ATTR: &str = "hosts";

pub const PATH_ATTR: &str = "path";
pub const PATH_TYPE_ATTR: &str = "path_type";
pub const PORT_ID_ATTR: &str = "port_id";

fn validate_path(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    validators::non_empty_string(value, name)?;
    match value.as_str() {
        Some(path) if path.starts_with('/') => Ok(()),
        _ => Err(InterpretationError::new(format!(
            "Value for '{}' must be an absolute path starting with '/'",
            name
        ))),
    }
}

fn validate_path_type(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    validators::string_values(value, name, IngressPathType::NAMES)
}

fn ingress_http_rule_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::required(PATH_ATTR, ArgumentKind::STRING).with_validator(validate_path),
        BuiltinArgument::required(PORT_ID_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::optional(PATH_TYPE_ATTR, ArgumentKind::STRING)
            .with_validator(validate_path_type),
    ]
}

kurtosis_value_type!(
    /// Routes one HTTP path to a named service port.
    IngressHttpRule,
    INGRESS_HTTP_RULE_TYPE_NAME,
    ingress_http_rule_arguments
);

impl IngressHttpRule {
    pub fn port_id(&self) -> Result<String> {
        self.base.required_attr_value(PORT_ID_ATTR)
    }

    pub fn to_kurtosis_type(&self) -> Result<IngressRuleRecord> {
        let path_type = match self.base.extract_attr_value::<String>(PATH_TYPE_ATTR)? {
            None => IngressPathType::default(),
            Some(text) => IngressPathType::parse(&text).ok_or_else(|| {
                StartosisError::interpretation(format!(
                    "Invalid ingress path type '{}'. Valid values are {}",
                    text,
                    IngressPathType::NAMES.join(", ")
                ))
            })?,
        };
        Ok(IngressRuleRecord {
            path: self.base.required_attr_value(PATH_ATTR)?,
            path_type,
            port_id: self.port_id()?,
        })
    }
}

fn ingress_tls_config_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::required(SECRET_NAME_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::optional(HOSTS_ATTR, ArgumentKind::LIST)
            .with_validator(validators::string_list_with_not_empty_values),
    ]
}

kurtosis_value_type!(
    /// TLS termination for an ingress, backed by a Kubernetes secret.
    IngressTlsConfig,
    INGRESS_TLS_CONFIG_TYPE_NAME,
    ingress_tls_config_arguments
);

impl IngressTlsConfig {
    pub fn to_kurtosis_type(&self) -> Result<IngressTlsRecord> {
        let hosts = match self.base.extract_attr_value::<Value>(HOSTS_ATTR)? {
            Some(value) => safe_cast_to_string_list(&value, HOSTS_ATTR)?,
            None => Vec::new(),
        };
        Ok(IngressTlsRecord {
            secret_name: self.base.required_attr_value(SECRET_NAME_ATTR)?,
            hosts,
        })
    }
}

fn ingress_spec_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::required(HOST_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::optional(INGRESS_CLASS_NAME_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::optional(ANNOTATIONS_ATTR, ArgumentKind::DICT)
            .with_validator(validators::kubernetes_annotations),
        BuiltinArgument::optional(TLS_ATTR, ArgumentKind::Composite(INGRESS_TLS_CONFIG_TYPE_NAME)),
        BuiltinArgument::optional(HTTP_RULES_ATTR, ArgumentKind::LIST),
    ]
}

kurtosis_value_type!(
    /// A Kubernetes ingress exposing a service under a host name.
    IngressSpec,
    INGRESS_SPEC_TYPE_NAME,
    ingress_spec_arguments
);

impl IngressSpec {
    pub fn host(&self) -> Result<String> {
        self.base.required_attr_value(HOST_ATTR)
    }

    pub fn ingress_class_name(&self) -> Result<Option<String>> {
        self.base.extract_attr_value(INGRESS_CLASS_NAME_ATTR)
    }

    pub fn annotations(&self) -> Result<BTreeMap<String, String>> {
        match self.base.extract_attr_value::<Value>(ANNOTATIONS_ATTR)? {
            Some(value) => Ok(safe_cast_to_string_map(&value, ANNOTATIONS_ATTR)?),
            None => Ok(BTreeMap::new()),
        }
    }

    pub fn tls_config(&self) -> Result<Option<IngressTlsConfig>> {
        self.base.extract_attr_value(TLS_ATTR)
    }

    /// The HTTP rules in declaration order.
    pub fn rules(&self) -> Result<Vec<IngressHttpRule>> {
        let Some(value) = self.base.extract_attr_value::<Value>(HTTP_RULES_ATTR)? else {
            return Ok(Vec::new());
        };
        let Some(list) = value.as_list() else {
            return Ok(Vec::new());
        };
        let items = list.borrow();
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                item.downcast_ref::<IngressHttpRule>().cloned().ok_or_else(|| {
                    StartosisError::interpretation(format!(
                        "Item number {} in '{}' list was not of type {} (was '{}')",
                        idx,
                        HTTP_RULES_ATTR,
                        INGRESS_HTTP_RULE_TYPE_NAME,
                        item.type_name()
                    ))
                })
            })
            .collect()
    }

    pub fn to_kurtosis_type(&self) -> Result<IngressRecord> {
        let tls = match self.tls_config()? {
            Some(tls) => Some(tls.to_kurtosis_type()?),
            None => None,
        };
        let rules = self
            .rules()?
            .iter()
            .map(IngressHttpRule::to_kurtosis_type)
            .collect::<Result<Vec<_>>>()?;
        Ok(IngressRecord {
            host: self.host()?,
            ingress_class_name: self.ingress_class_name()?,
            annotations: self.annotations()?,
            tls,
            rules,
        })
    }
}
