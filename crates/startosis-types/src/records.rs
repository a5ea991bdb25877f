//! Immutable domain records handed to the execution engine.
//!
//! Composite values convert into these through `to_kurtosis_type`. They
//! hold plain Rust data only and serialize with `serde`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use startosis_core::ScriptDuration;

use crate::config::duration_text;

/// Transport protocol of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransportProtocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl TransportProtocol {
    pub const NAMES: &'static [&'static str] = &["TCP", "UDP", "SCTP"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportProtocol::Tcp => "TCP",
            TransportProtocol::Udp => "UDP",
            TransportProtocol::Sctp => "SCTP",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "TCP" => Some(TransportProtocol::Tcp),
            "UDP" => Some(TransportProtocol::Udp),
            "SCTP" => Some(TransportProtocol::Sctp),
            _ => None,
        }
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A port a service exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpecRecord {
    pub number: u16,
    pub transport_protocol: TransportProtocol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_protocol: Option<String>,
}

/// User and group a service container runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUser {
    pub uid: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TolerationOperator {
    #[default]
    Equal,
    Exists,
}

impl TolerationOperator {
    pub const NAMES: &'static [&'static str] = &["Equal", "Exists"];

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "Equal" => Some(TolerationOperator::Equal),
            "Exists" => Some(TolerationOperator::Exists),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TolerationEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

impl TolerationEffect {
    pub const NAMES: &'static [&'static str] = &["NoSchedule", "PreferNoSchedule", "NoExecute"];

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "NoSchedule" => Some(TolerationEffect::NoSchedule),
            "PreferNoSchedule" => Some(TolerationEffect::PreferNoSchedule),
            "NoExecute" => Some(TolerationEffect::NoExecute),
            _ => None,
        }
    }
}

/// A Kubernetes toleration. An absent effect matches every effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TolerationRecord {
    pub key: String,
    pub operator: TolerationOperator,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<TolerationEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toleration_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentDirectoryRecord {
    pub persistent_key: String,
    pub size_mb: u64,
}

/// Build an image from a Dockerfile inside a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBuildSpecRecord {
    pub image_name: String,
    pub build_context_dir: PathBuf,
    pub build_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_stage: Option<String>,
    pub build_args: BTreeMap<String, String>,
}

/// Pull an image from a registry that needs credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRegistrySpecRecord {
    pub image: String,
    pub registry: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// Build an image from a nix flake inside a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NixBuildSpecRecord {
    pub image_name: String,
    pub build_context_dir: PathBuf,
    pub flake_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flake_output: Option<String>,
}

/// Where a service image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ImageSource {
    /// Pull by name from a public registry.
    Pull,
    Build(ImageBuildSpecRecord),
    Registry(ImageRegistrySpecRecord),
    Nix(NixBuildSpecRecord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageDownloadMode {
    Always,
    #[default]
    Missing,
}

/// How an ingress path is matched against request paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IngressPathType {
    #[default]
    Prefix,
    Exact,
    ImplementationSpecific,
}

impl IngressPathType {
    pub const NAMES: &'static [&'static str] = &["Prefix", "Exact", "ImplementationSpecific"];

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "Prefix" => Some(IngressPathType::Prefix),
            "Exact" => Some(IngressPathType::Exact),
            "ImplementationSpecific" => Some(IngressPathType::ImplementationSpecific),
            _ => None,
        }
    }
}

/// One HTTP path routed to a named service port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRuleRecord {
    pub path: String,
    pub path_type: IngressPathType,
    pub port_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressTlsRecord {
    pub secret_name: String,
    pub hosts: Vec<String>,
}

/// A Kubernetes ingress in front of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRecord {
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,
    pub annotations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<IngressTlsRecord>,
    pub rules: Vec<IngressRuleRecord>,
}

/// A fully resolved service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfigRecord {
    pub image_name: String,
    pub image_source: ImageSource,
    pub private_ports: BTreeMap<String, PortSpecRecord>,
    pub public_ports: BTreeMap<String, PortSpecRecord>,
    /// Mount path to the artifacts expanded there.
    pub files_artifacts: BTreeMap<String, Vec<String>>,
    pub persistent_directories: BTreeMap<String, PersistentDirectoryRecord>,
    pub entrypoint: Vec<String>,
    pub cmd: Vec<String>,
    pub env_vars: BTreeMap<String, String>,
    pub private_ip_address_placeholder: String,
    pub max_cpu_millicores: u64,
    pub min_cpu_millicores: u64,
    pub max_memory_mb: u64,
    pub min_memory_mb: u64,
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ServiceUser>,
    pub tolerations: Vec<TolerationRecord>,
    pub node_selectors: BTreeMap<String, String>,
    pub files_to_be_moved: BTreeMap<String, String>,
    pub image_download_mode: ImageDownloadMode,
    pub tini_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress: Option<IngressRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// A request the engine runs against a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecipeRecord {
    Http {
        method: HttpMethod,
        port_id: String,
        endpoint: String,
        body: String,
        content_type: String,
        /// Result key to jq expression.
        extractors: BTreeMap<String, String>,
        headers: BTreeMap<String, String>,
    },
    Exec {
        command: Vec<String>,
    },
}

/// Comparison applied to a recipe result field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assertion {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT_IN")]
    NotIn,
}

impl Assertion {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "==" => Some(Assertion::Equal),
            "!=" => Some(Assertion::NotEqual),
            ">=" => Some(Assertion::GreaterOrEqual),
            "<=" => Some(Assertion::LessOrEqual),
            ">" => Some(Assertion::Greater),
            "<" => Some(Assertion::Less),
            "IN" => Some(Assertion::In),
            "NOT_IN" => Some(Assertion::NotIn),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Assertion::Equal => "==",
            Assertion::NotEqual => "!=",
            Assertion::GreaterOrEqual => ">=",
            Assertion::LessOrEqual => "<=",
            Assertion::Greater => ">",
            Assertion::Less => "<",
            Assertion::In => "IN",
            Assertion::NotIn => "NOT_IN",
        }
    }
}

/// When a service counts as ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyConditionRecord {
    pub recipe: RecipeRecord,
    pub field: String,
    pub assertion: Assertion,
    pub target_value: serde_json::Value,
    #[serde(with = "duration_text")]
    pub interval: ScriptDuration,
    #[serde(with = "duration_text")]
    pub timeout: ScriptDuration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enum_round_trips() {
        for name in TransportProtocol::NAMES {
            assert_eq!(TransportProtocol::parse(name).unwrap().as_str(), *name);
        }
        for token in ["==", "!=", ">=", "<=", ">", "<", "IN", "NOT_IN"] {
            assert_eq!(Assertion::parse(token).unwrap().token(), token);
        }
        assert_eq!(TransportProtocol::parse("tcp"), None);
    }

    #[test]
    fn test_password_is_not_serialized() {
        let spec = ImageRegistrySpecRecord {
            image: "acme/api".to_string(),
            registry: "registry.acme.io".to_string(),
            email: "ops@acme.io".to_string(),
            username: "ops".to_string(),
            password: "hunter2".to_string(),
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_ready_condition_json() {
        let record = ReadyConditionRecord {
            recipe: RecipeRecord::Exec {
                command: vec!["true".to_string()],
            },
            field: "code".to_string(),
            assertion: Assertion::Equal,
            target_value: json!(0),
            interval: ScriptDuration::from_secs(1),
            timeout: ScriptDuration::from_mins(15),
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "recipe": {"type": "exec", "command": ["true"]},
                "field": "code",
                "assertion": "==",
                "target_value": 0,
                "interval": "1s",
                "timeout": "15m0s"
            })
        );
    }
}
